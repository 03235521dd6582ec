//! log macro's for engine, plan and network logging

/// Writes a debug! message to the app::engine logger
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)+) => {
        log::debug!(target: "app::engine", $($arg)+)
    };
}

/// Writes an info! message to the app::engine logger
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)+) => {
        log::info!(target: "app::engine", $($arg)+)
    };
}

/// Writes an warn! message to the app::engine logger
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)+) => {
        log::warn!(target: "app::engine", $($arg)+)
    };
}

/// Writes an error! message to the app::engine logger
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)+) => {
        log::error!(target: "app::engine", $($arg)+)
    };
}

/// Writes a debug! message to the app::plan logger
#[macro_export]
macro_rules! plan_debug {
    ($($arg:tt)+) => {
        log::debug!(target: "app::plan", $($arg)+)
    };
}

/// Writes an info! message to the app::plan logger
#[macro_export]
macro_rules! plan_info {
    ($($arg:tt)+) => {
        log::info!(target: "app::plan", $($arg)+)
    };
}

/// Writes an error! message to the app::plan logger
#[macro_export]
macro_rules! plan_error {
    ($($arg:tt)+) => {
        log::error!(target: "app::plan", $($arg)+)
    };
}

/// Writes a debug! message to the app::network logger
#[macro_export]
macro_rules! net_debug {
    ($($arg:tt)+) => {
        log::debug!(target: "app::network", $($arg)+)
    };
}

/// Writes an info! message to the app::network logger
#[macro_export]
macro_rules! net_info {
    ($($arg:tt)+) => {
        log::info!(target: "app::network", $($arg)+)
    };
}

/// Writes an warn! message to the app::network logger
#[macro_export]
macro_rules! net_warn {
    ($($arg:tt)+) => {
        log::warn!(target: "app::network", $($arg)+)
    };
}
