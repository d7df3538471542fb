/// Components that make up the two channel relay board.
pub mod relay_board {
    /// Components that provide sensing capability.
    pub mod sensing {
        /// Background reader that frames the serial byte stream.
        pub mod frame_reader;
    }
    /// Components that provide actuation capability.
    pub mod actuating {
        /// The two channel relay state machine.
        pub mod relay_controller;
    }
    /// Periodic consumer turning decoded messages into relay transitions.
    pub mod dispatcher;
    /// Startup and shutdown of the serial reader.
    pub mod lifecycle;
    /// Single threaded control panel event loop.
    pub mod panel;
}

/// Helpful prelude when working with components.
pub mod prelude {
    pub use crate::components::relay_board::actuating::relay_controller::*;
    pub use crate::components::relay_board::dispatcher::*;
    pub use crate::components::relay_board::lifecycle::*;
    pub use crate::components::relay_board::panel::*;
    pub use crate::components::relay_board::sensing::frame_reader::*;
}
