/// Devices are the atomic units that can be combined together
/// into components. Their core responsibilities do not change
/// based on location, name etc.
pub mod hardware {
    /// Binary outputs driving the relay coils.
    pub mod output_pin;
    /// Serial connection carrying LLAP frames.
    pub mod serial_link;
}

/// Devices that only exist on screen.
pub mod software {
    /// Visual relay indicators for the control panel.
    pub mod indicator;
}
