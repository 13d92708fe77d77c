use thiserror::Error;

use crate::graph::ObjectId;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::MalformedStream {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::MalformedStream {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can
/// potentially return.
///
/// This enum covers every failure mode of NRBF stream decoding and graph encoding.
/// All decode-side errors are fatal to the enclosing call: no partial graph is
/// returned except through [`crate::decode_diagnostic`].
///
/// # Error Categories
///
/// ## Stream Decoding Errors
/// - [`Error::MalformedStream`] - Invalid header, tag or enum byte in the input
/// - [`Error::TruncatedStream`] - Declared length exceeds the remaining bytes
/// - [`Error::UnsupportedRecordType`] - Recognized record tag with an unimplemented body
///
/// ## Reference Graph Errors
/// - [`Error::DanglingReference`] - Object id referenced but never defined
/// - [`Error::DuplicateObjectId`] - Object id defined more than once in one stream
/// - [`Error::UnknownClassId`] - `ClassWithId` references an undefined class
///
/// ## Resource Errors
/// - [`Error::ResourceLimitExceeded`] - A configured decode budget was exhausted
///
/// ## Encoding Errors
/// - [`Error::MissingTypeDescriptor`] - Instance does not match its class descriptor
/// - [`Error::IdCollision`] - Caller-constructed graph reuses an object id
/// - [`Error::Encode`] - Caller field value is not representable on the wire
///
/// # Examples
///
/// ```rust
/// use nrbf::Error;
///
/// match nrbf::decode(b"") {
///     Err(Error::TruncatedStream { expected, available }) => {
///         eprintln!("needed {} bytes, had {}", expected, available);
///     }
///     other => panic!("unexpected result: {:?}", other),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The stream is damaged and could not be parsed.
    ///
    /// Covers bad header versions, unknown record tags, invalid enum bytes,
    /// records appearing outside their valid position and null runs overrunning
    /// their value sequence. The error includes the source location where the
    /// malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file in which the error was detected
    /// * `line` - Source line in which the error was detected
    #[error("Malformed stream - {file}:{line}: {message}")]
    MalformedStream {
        /// The message to be printed for the malformed stream error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A declared length exceeds the remaining input.
    ///
    /// Raised before any allocation is made for the violating record, so a
    /// truncated stream can never drive memory use from its declared lengths.
    #[error("Truncated stream - needed {expected} more byte(s), only {available} available")]
    TruncatedStream {
        /// Number of bytes the current read required
        expected: usize,
        /// Number of bytes that were actually available
        available: usize,
    },

    /// An object id was referenced but never defined anywhere in the stream.
    ///
    /// Detected after `MessageEnd`, once every record has had the chance to
    /// define the id (forward references are legal until then).
    #[error("Reference to object id {0} which is never defined")]
    DanglingReference(ObjectId),

    /// An object id was defined by more than one record in the same stream.
    #[error("Object id {0} is defined more than once")]
    DuplicateObjectId(ObjectId),

    /// A `ClassWithId` record references a class object id with no cached descriptor.
    #[error("ClassWithId references unknown class object id {0}")]
    UnknownClassId(ObjectId),

    /// A recognized record tag whose body this implementation does not decode.
    ///
    /// `MethodCall` (0x15) and `MethodReturn` (0x16) belong to the MS-NRTP
    /// remoting envelope, which is outside the scope of this crate.
    #[error("Record type 0x{0:02X} is recognized but not supported")]
    UnsupportedRecordType(u8),

    /// A configured decode resource budget was exhausted.
    ///
    /// See [`crate::DecodeLimits`] for the available budgets. This bounds
    /// worst-case memory and time independent of lengths declared inside
    /// the stream.
    #[error("Resource limit exceeded - {what} (limit {limit})")]
    ResourceLimitExceeded {
        /// Which budget was exhausted
        what: &'static str,
        /// The configured limit that was hit
        limit: usize,
    },

    /// An instance to encode does not match the descriptor registered for its class.
    ///
    /// The first encoded instance of a class registers its member layout; every
    /// later instance of the same class must carry the same member names in the
    /// same order with compatible value kinds.
    #[error("No type descriptor for class '{0}' matches this instance")]
    MissingTypeDescriptor(String),

    /// A caller-constructed graph inserts two nodes under the same object id.
    #[error("Graph already contains an entry for object id {0}")]
    IdCollision(ObjectId),

    /// A caller-supplied field value is out of range for its wire representation.
    ///
    /// Reported, never silently clamped.
    #[error("{0}")]
    Encode(String),
}
