use super::ActionContext;
use crate::backend::BackendError;
use crate::model::cv_file::CvFile;

/// Storage creates this marker in otherwise empty folders.
const PLACEHOLDER: &str = ".emptyFolderPlaceholder";

fn object_path(ctx: &ActionContext, file_name: &str) -> String {
    format!("{}/{}", ctx.user_id(), file_name)
}

fn content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

fn valid_name(file_name: &str) -> Result<(), &'static str> {
    if file_name.trim().is_empty() {
        Err("file name is empty")
    } else if file_name.contains('/') || file_name.contains('\\') {
        Err("file name must not contain a path")
    } else {
        Ok(())
    }
}

/// The signed-in user's CVs.
pub async fn list_cvs(ctx: &ActionContext) -> Result<Vec<CvFile>, BackendError> {
    let rows = ctx.call(ctx.storage.list(ctx.user_id())).await?;
    Ok(rows
        .iter()
        .map(CvFile::from)
        .filter(|f| !f.name.is_empty() && f.name != PLACEHOLDER)
        .collect())
}

pub async fn upload_cv(ctx: &ActionContext, file_name: &str, bytes: Vec<u8>) -> bool {
    if let Err(reason) = valid_name(file_name) {
        ctx.reject("upload CV", reason);
        return false;
    }
    if bytes.is_empty() {
        ctx.reject("upload CV", "file is empty");
        return false;
    }
    let path = object_path(ctx, file_name);
    ctx.act(
        "upload CV",
        ctx.storage.upload(&path, bytes, content_type(file_name)),
        |_| format!("Uploaded {file_name}"),
    )
    .await
    .is_some()
}

pub async fn download_cv(ctx: &ActionContext, file_name: &str) -> Result<Vec<u8>, BackendError> {
    let path = object_path(ctx, file_name);
    ctx.call(ctx.storage.download(&path)).await
}

pub async fn delete_cv(ctx: &ActionContext, file_name: &str) -> bool {
    if let Err(reason) = valid_name(file_name) {
        ctx.reject("delete CV", reason);
        return false;
    }
    let path = object_path(ctx, file_name);
    ctx.act("delete CV", ctx.storage.remove(&path), |_| {
        format!("Deleted {file_name}")
    })
    .await
    .is_some()
}

pub fn public_url(ctx: &ActionContext, file_name: &str) -> String {
    ctx.storage.public_url(&object_path(ctx, file_name))
}
