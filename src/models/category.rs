use bitflags::bitflags;

bitflags! {
    /// Notification channel a message or query belongs to.
    ///
    /// Categories are masks: a handler subscribed under several channels records
    /// the union of all of them. The registry itself keys on the exact mask that
    /// was passed to [`NotifyHub::register`](crate::dispatch::NotifyHub::register),
    /// so `SCRIPT | NETWORK` is its own channel, distinct from `SCRIPT`.
    ///
    /// Bits outside the named constants are retained, which lets collaborators
    /// define private channels with [`Category::from_bits_retain`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Category: u32 {
        /// Application-wide status messages
        const GLOBAL = 1 << 0;
        /// Playlist and list views
        const LIST = 1 << 1;
        /// Media library and broadcast calendar
        const LIBRARY = 1 << 2;
        /// Danmu pool editing and source updates
        const DANMU_POOL = 1 << 3;
        /// Script errors and script-driven dialogs
        const SCRIPT = 1 << 4;
        /// Network failures
        const NETWORK = 1 << 5;
        /// Download tasks
        const DOWNLOAD = 1 << 6;
        /// Generic error reporting
        const ERROR = 1 << 7;
    }
}

impl Category {
    /// Human-readable label used in log output.
    pub fn label(self) -> String {
        if self.is_empty() {
            return "none".to_string();
        }

        let mut names: Vec<String> = self
            .iter_names()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect();

        let unnamed = self.bits() & !Category::all().bits();
        if unnamed != 0 {
            names.push(format!("{:#x}", unnamed));
        }

        names.join("|")
    }
}
