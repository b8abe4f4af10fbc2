/// Error code registry for graphflow
///
/// Error codes are organized by category:
/// - 1000-1999: Construction errors (stage wiring, stage configuration)
/// - 2000-2999: Execution errors (missing fields, scheduling, callbacks)
/// - 3000-3999: IO errors (record sources and sinks)
/// - 4000-4999: Configuration errors
pub struct ErrorCode;

impl ErrorCode {
    // Construction errors (1000-1999)
    pub const BUILD_BROKEN_CHAIN: u16 = 1001;
    pub const BUILD_UNKNOWN_STAGE: u16 = 1002;
    pub const BUILD_ALREADY_CONNECTED: u16 = 1003;
    pub const BUILD_SOURCE_NOT_FIRST: u16 = 1004;
    pub const BUILD_NOT_A_SOURCE: u16 = 1005;
    pub const BUILD_CHAIN_CYCLE: u16 = 1006;
    pub const BUILD_EMPTY_SORT_KEYS: u16 = 1007;
    pub const BUILD_INVALID_SORT_SPEC: u16 = 1008;
    pub const BUILD_UNKNOWN_STRATEGY: u16 = 1009;

    // Execution errors (2000-2999)
    pub const EXEC_MISSING_FIELD: u16 = 2001;
    pub const EXEC_NOT_COMPUTED: u16 = 2002;
    pub const EXEC_CIRCULAR_DEPENDENCY: u16 = 2003;
    pub const EXEC_MISSING_INPUT: u16 = 2004;
    pub const EXEC_OPERATION_FAILED: u16 = 2005;
    pub const EXEC_NOT_AN_OBJECT: u16 = 2006;

    // IO errors (3000-3999)
    pub const IO_FAILED: u16 = 3001;
    pub const IO_MALFORMED_RECORD: u16 = 3002;
    pub const IO_SERIALIZATION: u16 = 3003;

    // Configuration errors (4000-4999)
    pub const CONFIG_INVALID: u16 = 4001;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        1001 => "Stage chain is broken before reaching the source",
        1002 => "Stage does not belong to the chain",
        1003 => "Stage is already connected",
        1004 => "Source stage attached downstream of another stage",
        1005 => "Pipeline does not start with a source stage",
        1006 => "Stage connection would create a cycle",
        1007 => "Sort stage has no keys",
        1008 => "Sort specification could not be parsed",
        1009 => "Unknown join strategy",

        2001 => "Record is missing a required field",
        2002 => "Dependency pipeline has not been computed",
        2003 => "Circular pipeline dependency",
        2004 => "No input file configured for source",
        2005 => "User operation failed",
        2006 => "Value is not a JSON object",

        3001 => "File could not be read or written",
        3002 => "Line is not a valid JSON record",
        3003 => "Record could not be serialized",

        4001 => "Invalid configuration",

        _ => "Unknown error",
    }
}
