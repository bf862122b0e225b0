//! Application-wide constants for craftwrap.
//!
//! Groups the byte-level framing constants, thread names and configuration
//! defaults in one place.
//!
//! # Categories
//!
//! - **Framing**: line terminators and the platform line separator
//! - **Threads**: names given to background threads (visible in debuggers)
//! - **Defaults**: configuration values used when no file or env var says otherwise

// ============================================================================
// Framing
// ============================================================================

/// Carriage return, one of the two line terminator bytes.
pub const CR: u8 = b'\r';

/// Line feed, one of the two line terminator bytes.
pub const LF: u8 = b'\n';

/// Line separator appended to every line served by the input channel.
///
/// Matches what the platform's line-oriented readers expect.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";

/// Line separator appended to every line served by the input channel.
///
/// Matches what the platform's line-oriented readers expect.
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Returns `true` for the bytes that end a line (CR or LF).
#[must_use]
pub const fn is_line_terminator(byte: u8) -> bool {
    byte == CR || byte == LF
}

// ============================================================================
// Threads
// ============================================================================

/// Thread that copies lines from the real stdin into the pending queue.
pub const FORWARDER_THREAD_NAME: &str = "stdin-forwarder";

/// Thread that runs dispatched scripts one at a time.
pub const DISPATCH_THREAD_NAME: &str = "script-dispatch";

/// Thread that feeds the wrapped server's stdin from the input channel.
pub const STDIN_PUMP_THREAD_NAME: &str = "server-stdin";

/// Thread that feeds the output channel from the wrapped server's stdout.
pub const STDOUT_PUMP_THREAD_NAME: &str = "server-stdout";

// ============================================================================
// Defaults
// ============================================================================

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "craftwrap.json";

/// Default log file name inside the config directory.
pub const DEFAULT_LOG_FILE: &str = "craftwrap.log";

/// Operator commands start with `!`; the rest of the line is the command.
pub const DEFAULT_INPUT_TRIGGER: &str = r"^!(.+)$";

/// Vanilla server chat line `[12:00:00] [Server thread/INFO]: <Steve> !cmd`.
///
/// Group 1 is the player name, group 2 the command text.
pub const DEFAULT_OUTPUT_TRIGGER: &str =
    r"^\[[^\]]+\] \[[^\]]+\]: <([A-Za-z0-9_]{1,16})> !(.+)$";

/// Runs a command as a named player.
pub const DEFAULT_EXECUTE_COMMAND: &str = "execute as %s run %s";

/// Directory searched for scripts.
pub const DEFAULT_SCRIPT_DIRECTORY: &str = "scripts";

/// Extension (including the dot) of script files.
pub const DEFAULT_SCRIPT_EXTENSION: &str = ".lua";

/// Command used to start the wrapped server.
pub const DEFAULT_SERVER_COMMAND: &[&str] = &["java", "-jar", "server.jar", "nogui"];

/// Console command sent to the server when the wrapper is asked to shut down.
pub const DEFAULT_STOP_COMMAND: &str = "stop";

/// How often the supervisor checks the child and the shutdown flag.
pub const SUPERVISE_INTERVAL_MS: u64 = 100;
