/// A connection's progress through the current global scene load
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ClientLoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
}

impl ClientLoadState {
    pub fn is_loaded(&self) -> bool {
        *self == ClientLoadState::Loaded
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClientLoadState::Idle => "Idle",
            ClientLoadState::Loading => "Loading",
            ClientLoadState::Loaded => "Loaded",
        }
    }
}

/// Edge-triggered "everyone has loaded" flag.
///
/// `update()` must be called after every individual transition with the
/// states of all currently tracked connections. It returns `true` exactly on
/// the rising edge, so a barrier event fires once per episode.
#[derive(Clone, Debug, Default)]
pub struct LoadBarrier {
    all_loaded: bool,
    epoch: u64,
}

impl LoadBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_loaded(&self) -> bool {
        self.all_loaded
    }

    /// Number of times the barrier has fired
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn update<'a, I>(&mut self, states: I) -> bool
    where
        I: IntoIterator<Item = &'a ClientLoadState>,
    {
        let mut tracked = 0;
        for state in states {
            tracked += 1;
            if !state.is_loaded() {
                self.all_loaded = false;
                return false;
            }
        }

        // nobody tracked, nobody to wait for, nothing to announce
        if tracked == 0 {
            self.all_loaded = false;
            return false;
        }

        if self.all_loaded {
            return false;
        }

        self.all_loaded = true;
        self.epoch += 1;
        true
    }

    /// Continue counting from another barrier's epoch, for observers that
    /// join after earlier cycles
    pub fn resume_at(&mut self, epoch: u64) {
        self.epoch = epoch;
    }

    pub fn reset(&mut self) {
        self.all_loaded = false;
    }
}
