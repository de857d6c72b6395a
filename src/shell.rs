//! Shell command construction for downloads
//!
//! Every interpolated value is wrapped in single quotes after escaping, so the
//! commands are safe to hand to `bash -c`.

use crate::strings::shell_single_quote_escape;

/// User-Agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 BooruSidebar/1.0";

/// Escape a value for a single-quoted shell string (`'` becomes `'\''`)
pub fn shell_escape(s: &str) -> String {
    shell_single_quote_escape(s)
}

/// `curl` invocation that saves `url` to `output_path`
pub fn build_curl_command(url: &str, output_path: &str, user_agent: Option<&str>) -> String {
    let ua = user_agent.filter(|u| !u.is_empty()).unwrap_or(DEFAULT_USER_AGENT);
    format!(
        "curl -fsSL -A '{}' '{}' -o '{}'",
        shell_escape(ua),
        shell_escape(url),
        shell_escape(output_path)
    )
}

/// `mkdir -p` followed by a `curl` into `dir_path/file_name`
pub fn build_download_command(
    url: &str,
    dir_path: &str,
    file_name: &str,
    user_agent: Option<&str>,
) -> String {
    let ua = user_agent.filter(|u| !u.is_empty()).unwrap_or(DEFAULT_USER_AGENT);
    let dir = shell_escape(dir_path);
    format!(
        "mkdir -p '{dir}' && curl -fsSL -A '{}' '{}' -o '{dir}/{}'",
        shell_escape(ua),
        shell_escape(url),
        shell_escape(file_name)
    )
}
