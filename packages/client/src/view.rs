//! Game view controller: the single entry point that wires the countdown and
//! the live update channel together when the view becomes ready.

use std::{sync::Arc, time::Duration};

use spyfall_shared::time::Clock;

use crate::{
    channel::{ChannelConfig, ChannelObserver, LiveChannel},
    countdown::{CountdownSynchronizer, CountdownTask, DisplaySurface, ExpiryPolicy, TICK_PERIOD},
    error::ClientError,
};

/// Settings for one game view
#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub channel: ChannelConfig,
    pub expiry_policy: ExpiryPolicy,
    pub tick_period: Duration,
}

impl ViewSettings {
    pub fn new(channel: ChannelConfig) -> Self {
        Self {
            channel,
            expiry_policy: ExpiryPolicy::default(),
            tick_period: TICK_PERIOD,
        }
    }
}

/// An active game view.
///
/// Owns the countdown task and the live channel; dropping the view tears both
/// down.
pub struct GameView {
    channel: LiveChannel,
    countdown: Option<CountdownTask>,
}

impl GameView {
    /// Make the view ready.
    ///
    /// The countdown and the channel start independently: a missing timer
    /// element is logged and leaves the view without a countdown, while the
    /// channel still opens.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connection`] if the HTTP client cannot be built.
    pub fn start(
        settings: ViewSettings,
        surface: Arc<dyn DisplaySurface>,
        clock: Arc<dyn Clock>,
        observers: Vec<Arc<dyn ChannelObserver>>,
    ) -> Result<Self, ClientError> {
        let countdown = CountdownSynchronizer::initialize(surface, clock).map(|synchronizer| {
            synchronizer.spawn_with_period(settings.expiry_policy, settings.tick_period)
        });
        let channel = LiveChannel::open(settings.channel, observers)?;

        Ok(Self { channel, countdown })
    }

    /// The player pressed the close button: stop live updates
    pub fn leave(&self) {
        self.channel.close();
    }

    pub fn channel(&self) -> &LiveChannel {
        &self.channel
    }

    pub fn countdown(&self) -> Option<&CountdownTask> {
        self.countdown.as_ref()
    }

    pub fn countdown_mut(&mut self) -> Option<&mut CountdownTask> {
        self.countdown.as_mut()
    }
}
