//! Uploading attached documents.

use tracing::{error, info, instrument, warn};

use crate::{
    base::{
        replies::{self, MAX_FILES},
        types::{FileDescriptor, IngestOutcome, MentionEvent, Res, Void},
    },
    runtime::Runtime,
    service::docs::SupportedFiletype,
};

use super::reply;

/// A refusal for uploads with more than `min_exclusive` files.
pub struct CountRule {
    pub min_exclusive: usize,
    pub message: fn(&str) -> String,
}

/// Refusals by file count, checked top-down; the first match wins.
pub static FILE_COUNT_RULES: [CountRule; 4] = [
    CountRule { min_exclusive: 9, message: replies::files_way_too_many },
    CountRule { min_exclusive: 7, message: replies::files_far_too_many },
    CountRule { min_exclusive: 5, message: replies::files_too_many },
    CountRule { min_exclusive: MAX_FILES, message: replies::files_a_lot },
];

/// Returns the refusal for this many files, if any applies.
pub fn select_count_rule(count: usize) -> Option<&'static CountRule> {
    FILE_COUNT_RULES.iter().find(|rule| count > rule.min_exclusive)
}

/// Uploads the attached files, and reports the outcome to the user.
#[instrument(skip_all, fields(count = files.len()))]
pub async fn handle_upload(event: &MentionEvent, files: &[FileDescriptor], runtime: &Runtime) -> Void {
    let user = event.user.as_str();

    if let Some(rule) = select_count_rule(files.len()) {
        warn!("Refusing to upload {} files.", files.len());
        return reply(runtime, event, &(rule.message)(user)).await;
    }

    reply(runtime, event, &replies::upload_started(user)).await?;

    let mut wrong_filetype = false;
    let mut upload_error = false;
    let mut file_count = 0;

    for file in files {
        let Ok(filetype) = file.filetype.parse::<SupportedFiletype>() else {
            warn!("Skipping file with unsupported filetype `{}`.", file.filetype);
            wrong_filetype = true;
            continue;
        };

        match upload_file(runtime, filetype, &file.url_private_download, user).await {
            Ok(outcome) => {
                file_count += 1;

                if outcome.is_duplicate {
                    info!("Skipped duplicate file `{}`.", outcome.doc_id);
                }
            }
            Err(err) => {
                upload_error = true;
                error!("Failed to upload a {} file: {:#}", filetype, err);
            }
        }
    }

    info!("Uploaded {} of {} files.", file_count, files.len());

    let summary = replies::upload_summary(user, file_count, wrong_filetype, upload_error, &SupportedFiletype::list());

    reply(runtime, event, &summary).await
}

/// Indexes one file, and associates it with the user.
async fn upload_file(runtime: &Runtime, filetype: SupportedFiletype, url: &str, user: &str) -> Res<IngestOutcome> {
    let outcome = runtime.docs.add_file(filetype, url, user).await?;

    runtime.db.add_user_doc(user, &outcome.doc_id).await?;

    Ok(outcome)
}

// Tests.
