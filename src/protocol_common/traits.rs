//! Protocol trait abstractions
//!
//! [`TerminalProtocol`] is the seam between the protocol engine and whatever
//! transport feeds it bytes. Negotiation stays on the transport side.

use crate::error::Result;
use crate::logging::StreamLogger;

/// Terminal protocol trait defining core protocol operations
pub trait TerminalProtocol {
    /// Process incoming data from the host
    ///
    /// # Arguments
    ///
    /// * `data` - Raw bytes received from the host, in any chunking
    /// * `logger` - Session logger receiving diagnostics
    fn process_data(&mut self, data: &[u8], logger: &mut StreamLogger) -> Result<()>;

    /// Next pending response for the host, if any
    fn generate_response(&mut self) -> Option<Vec<u8>>;

    /// Reset the protocol state to initial conditions
    fn reset(&mut self);

    /// Get the protocol name (e.g., "TN3270")
    fn protocol_name(&self) -> &str;
}
