pub const APP_NAME: &str = "trellis";

/// File name of the generated (or, in origin mode, user supplied) entry point.
pub const ENTRY_FILENAME: &str = "main.go";

/// Descriptor file looked up when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = ".tr_complier.yaml";

/// Overrides the toolchain binary (defaults to `go` on `PATH`).
pub const TOOLCHAIN_ENV: &str = "TRELLIS_GO";

/// Build-mode toggle handed to the toolchain process.
pub const CGO_ENV: &str = "CGO_ENABLED";

/// Target OS override, same variable the Go toolchain honours.
pub const TARGET_OS_ENV: &str = "GOOS";
