//! Raw `show configuration` output handling

/// Start of the configuration dump inside a NETCONF command reply
pub const START_MARKER: &str = "<configuration-output>";

/// End of the configuration dump inside a NETCONF command reply
pub const END_MARKER: &str = "</configuration-output>";

/// Leading token of every `display set` statement
pub const SET_TOKEN: &str = "set";

/// Non-empty, trimmed lines of the configuration dump.
///
/// When the start marker is present, everything up to and including its line
/// is skipped. Iteration stops at the line holding the end marker.
pub fn config_lines(output: &str) -> impl Iterator<Item = &str> {
    let body = match output.find(START_MARKER) {
        Some(position) => {
            let from_marker = &output[position..];
            from_marker
                .find('\n')
                .map(|newline| &from_marker[newline + 1..])
                .unwrap_or("")
        }
        None => output,
    };
    body.lines()
        .take_while(|line| !line.contains(END_MARKER))
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

/// Whether the dump holds any configuration at all
pub fn has_configuration(output: &str) -> bool {
    config_lines(output).next().is_some()
}

/// Statement of a `set ...` line, `None` for any other line
pub fn statement(line: &str) -> Option<&str> {
    line.strip_prefix(SET_TOKEN)?
        .strip_prefix(' ')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
