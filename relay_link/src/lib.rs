/**
The relay link control system toggles two relay outputs from a control panel and,
when a serial link is available, from LLAP command frames received over that link.
Serial ingestion runs on its own reader thread and hands decoded messages to a
dispatcher that runs inside the single-threaded panel event loop, so relay state
is only ever touched from one place.
*/

/// Components in the system are created by grouping together
/// devices into a logical unit that performs some function
/// for the overall control system.
pub mod components;
/// Devices that are an atomic unit, and can be composed
/// with other devices into components to perform some function.
pub mod devices;
/// Message structure for communication into the control
/// system, i.e. the LLAP wire format and the hand-off queue
/// between the reader thread and the dispatcher.
pub mod messages;
/// Configuration read from yaml files at startup.
pub mod settings;
/// Development utilities for exercising components without hardware.
pub mod utils;
