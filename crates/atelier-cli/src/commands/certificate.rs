//! `atelier certificate` — list, verify, download, and share certificates.

use std::path::{Path, PathBuf};

use serde_json::json;

use super::{failure, print_json, to_json, Context};

pub async fn list(ctx: &Context) -> Result<(), String> {
    let uid = ctx.require_user()?;
    let certificates = ctx
        .api
        .list_user_certificates(uid)
        .await
        .map_err(|e| e.to_string())?;
    print_json(&json!({ "certificates": to_json(&certificates)? }));
    Ok(())
}

pub async fn get(ctx: &Context, certificate_id: &str) -> Result<(), String> {
    let certificate = ctx
        .api
        .get_certificate(certificate_id)
        .await
        .map_err(|e| e.to_string())?;
    print_json(&to_json(&certificate)?);
    Ok(())
}

/// Prints the verification result; an invalid certificate is an error exit.
pub async fn verify(ctx: &Context, code: &str) -> Result<(), String> {
    let result = ctx
        .api
        .verify_certificate(code)
        .await
        .map_err(|e| e.to_string())?;
    print_json(&to_json(&result)?);
    if result.is_valid {
        Ok(())
    } else {
        Err(result
            .error
            .unwrap_or_else(|| "Certificate is not valid".to_string()))
    }
}

/// Save the PDF to `output`, or `<certificate_id>.pdf` in the working directory.
pub async fn download(
    ctx: &Context,
    certificate_id: &str,
    output: Option<&Path>,
) -> Result<(), String> {
    let bytes = ctx
        .api
        .download_certificate(certificate_id)
        .await
        .map_err(|e| e.to_string())?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("{}.pdf", certificate_id)));
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    tracing::info!("[CLI] saved certificate {} to {}", certificate_id, path.display());
    print_json(&json!({
        "certificateId": certificate_id,
        "path": path.display().to_string(),
        "bytes": bytes.len(),
    }));
    Ok(())
}

pub async fn share(ctx: &Context, certificate_id: &str) -> Result<(), String> {
    let link = ctx
        .api
        .share_certificate(certificate_id)
        .await
        .map_err(|e| e.to_string())?;
    print_json(&to_json(&link)?);
    Ok(())
}

pub async fn issue(ctx: &Context, workshop_id: &str) -> Result<(), String> {
    let orchestrator = ctx.orchestrator();
    let certificate = orchestrator
        .issue_certificate(workshop_id)
        .await
        .ok_or_else(|| failure(&orchestrator))?;
    print_json(&to_json(&certificate)?);
    Ok(())
}
