/// Get the version string for azlook and libazlook
pub fn get_version_string() -> String {
    format!(
        "azlook {}\nlibazlook {}",
        env!("CARGO_PKG_VERSION"),
        libazlook::version()
    )
}

/// Print version information to stdout
pub fn print_version() {
    println!("{}", get_version_string());
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
