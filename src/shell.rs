//! Shell startup file detection and editing.
//!
//! govm exposes the toolchain by appending a sentinel-delimited export block
//! to the user's rc file. The text transforms here are pure; the pipeline
//! owns the file I/O.

use crate::types::Action;

/// Known shells and the rc file (relative to the home directory) each one
/// sources on startup. Sweeps visit entries in this order.
pub const SHELL_RC_FILES: &[(&str, &str)] = &[
    ("/bin/bash", ".bashrc"),
    ("/usr/bin/bash", ".bashrc"),
    ("/bin/zsh", ".zshrc"),
    ("/usr/bin/zsh", ".zshrc"),
    ("/bin/ksh", ".kshrc"),
    ("/usr/bin/ksh", ".kshrc"),
    ("/bin/fish", ".config/fish/config.fish"),
    ("/usr/bin/fish", ".config/fish/config.fish"),
];

/// Exact-path lookup; `/usr/local/bin/bash` is not `/bin/bash`.
pub fn rc_file_for(shell: &str) -> Option<&'static str> {
    SHELL_RC_FILES
        .iter()
        .find(|(path, _)| *path == shell)
        .map(|(_, rc)| *rc)
}

/// Appends the export block for `action`. Content that already carries a
/// complete govm block is returned as is.
pub fn patch(content: &str, action: &Action) -> String {
    if next_block(content, 0).is_some() {
        return content.to_string();
    }
    format!("{}\n{}", content, action.export())
}

/// Removes every govm block along with the newline `patch` put in front of
/// it. Unterminated and stale begin markers are left alone.
pub fn unpatch(content: &str) -> String {
    let mut out = content.to_string();
    let mut from = 0;

    while let Some((start, stop)) = next_block(&out, from) {
        let start = if out[..start].ends_with('\n') { start - 1 } else { start };
        out.replace_range(start..stop, "");
        from = start;
    }
    out
}

/// Byte range of the first complete block at or after `from`. A begin
/// marker with another begin marker before its end marker is stale; the
/// block starts at the later one.
fn next_block(content: &str, from: usize) -> Option<(usize, usize)> {
    let begin = Action::export_begin();
    let end = Action::export_end();

    let mut start = from + content[from..].find(begin)?;
    loop {
        let body = start + begin.len();
        let close = body + content[body..].find(end)?;
        match content[body..close].find(begin) {
            Some(offset) => start = body + offset,
            None => return Some((start, close + end.len())),
        }
    }
}
