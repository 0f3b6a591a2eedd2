// RELAY click — two SPDT relays behind transistor drivers.
//
// Pure pin set/clear, no data path. Coil state is tracked here so
// toggle works without stateful-pin support from the HAL.

use embedded_hal::digital::OutputPin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Relay1,
    Relay2,
}

pub struct Relay<P1, P2> {
    rel1: P1,
    rel2: P2,
    state: [bool; 2],
}

impl<P1, P2> Relay<P1, P2>
where
    P1: OutputPin,
    P2: OutputPin,
{
    /// Both coils start released.
    pub fn new(mut rel1: P1, mut rel2: P2) -> Self {
        let _ = rel1.set_low();
        let _ = rel2.set_low();
        Self {
            rel1,
            rel2,
            state: [false, false],
        }
    }

    pub fn set(&mut self, channel: Channel, energized: bool) {
        match channel {
            Channel::Relay1 => {
                let _ = if energized {
                    self.rel1.set_high()
                } else {
                    self.rel1.set_low()
                };
                self.state[0] = energized;
            }
            Channel::Relay2 => {
                let _ = if energized {
                    self.rel2.set_high()
                } else {
                    self.rel2.set_low()
                };
                self.state[1] = energized;
            }
        }
    }

    pub fn on(&mut self, channel: Channel) {
        self.set(channel, true);
    }

    pub fn off(&mut self, channel: Channel) {
        self.set(channel, false);
    }

    pub fn toggle(&mut self, channel: Channel) {
        let idx = match channel {
            Channel::Relay1 => 0,
            Channel::Relay2 => 1,
        };
        self.set(channel, !self.state[idx]);
    }

    pub fn is_energized(&self, channel: Channel) -> bool {
        match channel {
            Channel::Relay1 => self.state[0],
            Channel::Relay2 => self.state[1],
        }
    }
}
