use super::*;
use crate::format::{self, OutputFormat};

/// Handle `blob props`
pub async fn handle_blob_props(ctx: &AppContext, args: &BlobArgs, format: OutputFormat) {
    let (service, container) = match build_service(ctx, args) {
        Ok(built) => built,
        Err(e) => ctx.fail(&e),
    };

    let spinner = ctx
        .formatter
        .spinner(&format!("Fetching properties of {}...", container));
    let result = probe_container(&service, &container).await;
    spinner.finish_and_clear();

    let probe = match result {
        Ok(probe) => probe,
        Err(e) => ctx.fail(&e),
    };

    match format::format_output(&probe, format) {
        Ok(output) => println!("{}", output),
        Err(e) => ctx.fail(&format!("formatting output: {}", e)),
    }
}
