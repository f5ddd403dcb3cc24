//! User-facing reply texts.
//!
//! Everything the bot says on its own (as opposed to relaying the model) lives
//! here, so the wording can be checked in one place.

/// Token that records consent to the terms of service.
pub const AGREE_TOKEN: &str = "+agree";

/// Marker that turns a mention into a question about uploaded documents.
pub const DOCS_TOKEN: &str = "+docs";

pub const CHANNEL_NOT_ALLOWED: &str = "Sorry, I'm not allowed to talk in this channel.";

pub const GENERIC_FAILURE: &str = "Sorry, something went wrong while responding to you. Blame OpenAI's API.";

pub const DOCS_QUERY_FAILURE: &str = "Sorry, something went wrong while answering your question about uploaded docs. Blame George.";

pub const DOCS_REVIEW_FAILURE: &str = "Sorry, something went wrong while reviewing uploaded docs. Blame George.";

pub const UNSAFE_RESPONSE: &str = "Sorry, the response was flagged as unsafe.";

/// Formats a Slack user mention.
pub fn mention(user: &str) -> String {
    format!("<@{user}>")
}

pub fn welcome(user: &str) -> String {
    format!(
        "Thanks for agreeing to the terms of service {}!\n\nHow can I help? You can upload a document by tagging me and attaching a file, and you can ask questions about uploaded documents by tagging me and typing `{DOCS_TOKEN}` at the start or end of your question. Or you can just chat with me by tagging me!",
        mention(user)
    )
}

pub fn terms_required(user: &str, terms: &str) -> String {
    format!(
        "Hey {}, before we can talk, you need to agree to the terms of service below. _*Please tag me and type `{AGREE_TOKEN}` to agree*_.\n\n{terms}",
        mention(user)
    )
}

pub fn upload_started(user: &str) -> String {
    format!("I'll try to upload your docs {}...but only because you asked nicely. This may take a while...", mention(user))
}

pub fn docs_answer(user: &str, response: &str) -> String {
    format!("{}, {response}", mention(user))
}

pub fn chat_answer(user: &str, response: &str) -> String {
    format!("Hey {}, {response}", mention(user))
}

/// Most files accepted in a single upload.
pub const MAX_FILES: usize = 3;

pub fn files_way_too_many(user: &str) -> String {
    format!(
        "{}, holy mother freaking poop balls dude, please limit your insatiable file uploading appetite to {MAX_FILES} files at a time.",
        mention(user)
    )
}

pub fn files_far_too_many(user: &str) -> String {
    format!("{}, you freaking dingus, that's way too many gosh darn files. Please only try to upload {MAX_FILES} files at a time.", mention(user))
}

pub fn files_too_many(user: &str) -> String {
    format!("{}, woah there pal, you can only upload {MAX_FILES} files at a time.", mention(user))
}

pub fn files_a_lot(user: &str) -> String {
    format!("{}, that's a lot of files, please only try to upload {MAX_FILES} files at a time.", mention(user))
}

/// Reports how an upload went.
///
/// `supported` is the user-facing list of filetypes, only shown when some file was skipped.
pub fn upload_summary(user: &str, file_count: usize, wrong_filetype: bool, upload_error: bool, supported: &str) -> String {
    let user = mention(user);
    let ask = format!("Feel free to ask me any questions about the docs you uploaded by tagging me and starting or ending your question with `{DOCS_TOKEN}`.");

    match (wrong_filetype, upload_error) {
        (true, true) => format!(
            "Hey {user}, you sent me at least one file that isn't a supported filetype, and I ran into an error while uploading your docs. I uploaded {file_count} docs, and I'm ignoring the rest. {ask}\n\nNote, supported filetypes are: {supported}."
        ),
        (true, false) => format!(
            "Hey {user}, you sent me at least one file that isn't a supported filetype. I uploaded {file_count} of the docs, and I'm ignoring the rest of the files. {ask}\n\nNote, supported filetypes are: {supported}."
        ),
        (false, true) => format!("Hey {user}, I ran into an error while uploading your docs. I uploaded {file_count} docs, and I'm ignoring the rest. {ask}"),
        (false, false) => format!(
            "Hey {user}, I uploaded all {file_count} documents! Now you can ask me a question about the docs you uploaded by tagging me and starting or ending your question with `{DOCS_TOKEN}`."
        ),
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_summary_variants() {
        let all_good = upload_summary("U1", 2, false, false, "pdf, csv");
        assert_eq!(
            all_good,
            "Hey <@U1>, I uploaded all 2 documents! Now you can ask me a question about the docs you uploaded by tagging me and starting or ending your question with `+docs`."
        );

        let wrong = upload_summary("U1", 1, true, false, "pdf, csv");
        assert!(wrong.contains("isn't a supported filetype. I uploaded 1 of the docs"));
        assert!(wrong.ends_with("Note, supported filetypes are: pdf, csv."));

        let failed = upload_summary("U1", 0, false, true, "pdf, csv");
        assert!(failed.starts_with("Hey <@U1>, I ran into an error while uploading your docs. I uploaded 0 docs"));
        assert!(!failed.contains("Note,"));

        let both = upload_summary("U1", 1, true, true, "pdf, csv");
        assert!(both.contains("and I ran into an error while uploading your docs. I uploaded 1 docs"));
        assert!(both.contains("Note, supported filetypes are"));
    }

    #[test]
    fn test_terms_required_includes_terms() {
        let text = terms_required("U1", "*Terms*");

        assert!(text.starts_with("Hey <@U1>, before we can talk"));
        assert!(text.contains("`+agree`"));
        assert!(text.ends_with("*Terms*"));
    }
}
