use super::*;
use crate::format::{self, OutputFormat};

fn client_or_exit(ctx: &AppContext, args: &RegistryArgs) -> ContainerRegistryClient {
    match build_client(ctx, args) {
        Ok(client) => client,
        Err(e) => ctx.fail(&e),
    }
}

fn print_or_exit<T: Formattable>(ctx: &AppContext, item: &T, format: OutputFormat) {
    match format::format_output(item, format) {
        Ok(output) => println!("{}", output),
        Err(e) => ctx.fail(&format!("formatting output: {}", e)),
    }
}

/// Handle `acr list`: every repository, manifest and tag
///
/// Pretty output is printed repository by repository as the walk goes.
pub async fn handle_acr_list(ctx: &AppContext, args: &RegistryArgs, format: OutputFormat) {
    let client = client_or_exit(ctx, args);
    let spinner = ctx
        .formatter
        .spinner(&format!("Walking {}...", client.endpoint()));

    let streaming = format == OutputFormat::Pretty;
    let mut printed = 0usize;
    let result = walk_registry_with(&client, |repository| {
        if streaming {
            spinner.suspend(|| print!("{}", repository.format_pretty()));
            printed += 1;
        }
    })
    .await;
    spinner.finish_and_clear();

    match result {
        Ok(walk) if streaming => println!("{}", walk.trailer()),
        Ok(walk) => print_or_exit(ctx, &walk, format),
        Err(e) => {
            if printed > 0 {
                ctx.formatter
                    .warning(&format!("Listing incomplete after {} repositories", printed));
            }
            ctx.fail(&e)
        }
    }
}

/// Handle `acr repos`
pub async fn handle_acr_repos(ctx: &AppContext, args: &RegistryArgs, format: OutputFormat) {
    let client = client_or_exit(ctx, args);
    let spinner = ctx.formatter.spinner("Listing repositories...");

    let result = list_repositories(&client).await;
    spinner.finish_and_clear();

    match result {
        Ok(list) if list.0.is_empty() && format == OutputFormat::Pretty => {
            println!("No repositories found.");
        }
        Ok(list) => print_or_exit(ctx, &list, format),
        Err(e) => ctx.fail(&e),
    }
}

/// Handle `acr tags <repository>`
pub async fn handle_acr_tags(
    ctx: &AppContext,
    args: &RegistryArgs,
    repository: &str,
    format: OutputFormat,
) {
    let client = client_or_exit(ctx, args);
    let spinner = ctx
        .formatter
        .spinner(&format!("Listing tags for {}...", repository));

    let result = list_tags(&client, repository).await;
    spinner.finish_and_clear();

    let tags = match result {
        Ok(tags) => tags,
        Err(e) => ctx.fail(&e),
    };

    match format {
        OutputFormat::Pretty => {
            if tags.is_empty() {
                println!("No tags found for repository '{}'.", repository);
                return;
            }
            use tabled::{Table, settings::Style};
            let table = Table::new(&tags).with(Style::empty()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&tags) {
            Ok(json) => println!("{}", json),
            Err(e) => ctx.fail(&format!("Error formatting JSON: {}", e)),
        },
        OutputFormat::Yaml => match serde_yaml::to_string(&tags) {
            Ok(yaml) => print!("{}", yaml),
            Err(e) => ctx.fail(&format!("Error formatting YAML: {}", e)),
        },
    }
}

/// Handle `acr show <repository> <digest-or-tag>`
pub async fn handle_acr_show(
    ctx: &AppContext,
    args: &RegistryArgs,
    repository: &str,
    reference: &str,
    format: OutputFormat,
) {
    let client = client_or_exit(ctx, args);
    let spinner = ctx
        .formatter
        .spinner(&format!("Fetching {}:{}...", repository, reference));

    let result = show_artifact(&client, repository, reference).await;
    spinner.finish_and_clear();

    match result {
        Ok(details) => print_or_exit(ctx, &details, format),
        Err(e) => ctx.fail(&e),
    }
}

/// Handle `acr check`
pub async fn handle_acr_check(ctx: &AppContext, args: &RegistryArgs, format: OutputFormat) {
    let client = client_or_exit(ctx, &check_args(args));
    let spinner = ctx.formatter.spinner("Checking registry...");

    let result = check_registry(&client).await;
    spinner.finish_and_clear();

    print_or_exit(ctx, &result, format);
    if !result.online {
        std::process::exit(1);
    }
}
