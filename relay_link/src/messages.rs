/// Standardise how messages are sent into the current
/// control system. Provide test suite to ensure
/// interfaces are respected.
pub mod control {
    /// LLAP messages arrive over the serial link as fixed
    /// width frames addressed to a two character device id.
    pub mod llap;
}

/// Thread safe hand-off of decoded messages from the
/// reader thread to the dispatcher.
pub mod transfer;
