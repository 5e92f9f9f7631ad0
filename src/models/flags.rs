use bitflags::bitflags;

bitflags! {
    /// Per-message delivery and presentation flags.
    ///
    /// Flags belong to the message, not to the handler. Only [`BLOCKING`]
    /// changes how the hub delivers; the rest are passed through for the
    /// surface to interpret.
    ///
    /// [`BLOCKING`]: MessageFlags::BLOCKING
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MessageFlags: u32 {
        /// Dismiss the message automatically
        const AUTO_HIDE = 1 << 0;
        /// Message describes an operation still in progress
        const PROCESS = 1 << 1;
        /// Offer a cancel affordance wired to the cancellation channel
        const SHOW_CANCEL = 1 << 2;
        /// Error severity
        const ERROR = 1 << 3;
        /// Wait for delivery even when called from a worker thread
        const BLOCKING = 1 << 4;
    }
}

impl MessageFlags {
    /// No flags set.
    pub const NONE: MessageFlags = MessageFlags::empty();

    pub fn is_blocking(self) -> bool {
        self.contains(MessageFlags::BLOCKING)
    }

    pub fn is_error(self) -> bool {
        self.contains(MessageFlags::ERROR)
    }
}
