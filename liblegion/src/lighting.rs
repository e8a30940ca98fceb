//! RGB lighting over raw 65-byte output reports.
//!
//! Two addressable zones, two packet shapes. The static-color packet and the
//! profile-select packet target *different* zone-id pairs; that asymmetry is
//! how the hardware works, not a bug. There is no off command: "off" is a
//! static-color write with brightness 0 and the color left intact.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use log::warn;

use crate::device;
use crate::state::SharedState;
use crate::types::{LedMode, Rgb};

/// Output reports are 65 bytes: report id first, then the payload.
pub const PACKET_LEN: usize = 65;

/// Zone ids addressed by the static-color packet.
pub const COLOR_ZONES: [u8; 2] = [0x03, 0x04];
/// Zone ids addressed by the profile-select packet.
pub const PROFILE_ZONES: [u8; 2] = [0x01, 0x02];

/// Profile id of the plain steady effect.
const PROFILE_STEADY: u8 = 0x01;
/// Profile id of the firmware rainbow effect.
const PROFILE_RAINBOW: u8 = 0x04;

/// The hardware needs spacing between writes across the two zone addresses.
const INTER_PACKET_DELAY: Duration = Duration::from_millis(20);

/// Cadence of the software pulse sweep.
const PULSE_TICK: Duration = Duration::from_millis(100);
/// Phase change per pulse tick, in percent.
const PULSE_STEP: u8 = 4;

pub type Packet = [u8; PACKET_LEN];

/// Scale a 0..100 percentage onto the 0..255 wire range, flooring.
pub fn brightness_byte(pct: u8) -> u8 {
    (u16::from(pct.min(100)) * 255 / 100) as u8
}

/// Static color for one zone.
pub fn static_color_packet(zone: u8, color: Rgb, brightness_pct: u8) -> Packet {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = 0x05;
    packet[1] = 0x0c;
    packet[2] = 0x72;
    packet[3] = 0x01;
    packet[4] = zone;
    packet[5] = 0x01;
    packet[6] = color.r;
    packet[7] = color.g;
    packet[8] = color.b;
    packet[9] = brightness_byte(brightness_pct);
    packet[10] = 0x00;
    packet[11] = 0x01;
    packet[12] = 0x01;
    packet
}

/// Effect selection for one zone.
pub fn profile_packet(zone: u8, profile: u8) -> Packet {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = 0x05;
    packet[1] = 0x06;
    packet[2] = 0x73;
    packet[3] = zone;
    packet[4] = 0x00;
    packet[5] = profile;
    packet[6] = 0x01;
    packet
}

fn color_packets(color: Rgb, brightness_pct: u8) -> Vec<Packet> {
    COLOR_ZONES.iter().map(|&zone| static_color_packet(zone, color, brightness_pct)).collect()
}

fn profile_packets(profile: u8) -> Vec<Packet> {
    PROFILE_ZONES.iter().map(|&zone| profile_packet(zone, profile)).collect()
}

/// Where finished packets go. Production opens a device handle per write;
/// tests capture the bytes.
pub trait PacketSink {
    fn write(&mut self, packet: &Packet) -> Result<()>;
}

/// Opens a fresh handle for every packet. Opening is relatively expensive
/// but writes are rare; the slider-drag debounce lives in the UI layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HidPacketSink;

impl PacketSink for HidPacketSink {
    fn write(&mut self, packet: &Packet) -> Result<()> {
        let handle = device::open()?;
        handle.write(packet)?;
        Ok(())
    }
}

/// Authoritative lighting state and its transition rules.
///
/// Pulse owns the hardware brightness while it is active. Every manual edit
/// (color, brightness, or a non-pulse mode) first leaves Pulse, so exactly
/// one writer drives the brightness value at any time. Each transition
/// returns the packets that realize it, in write order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedState {
    pub mode: LedMode,
    pub color: Rgb,
    pub brightness_pct: u8,
    pub pulse_phase: u8,
    pulse_rising: bool,
}

impl Default for LedState {
    fn default() -> Self {
        LedState {
            mode: LedMode::Off,
            color: Rgb::WHITE,
            brightness_pct: 100,
            pulse_phase: 0,
            pulse_rising: true,
        }
    }
}

impl LedState {
    /// Manual color edit. Leaves Pulse/Rainbow/Off for Static.
    pub fn set_color(&mut self, color: Rgb) -> Vec<Packet> {
        self.color = color;
        self.mode = LedMode::Static;
        color_packets(self.color, self.brightness_pct)
    }

    /// Manual brightness edit. A color-packet write implies the steady
    /// effect, so this also lands in Static.
    pub fn set_brightness(&mut self, pct: u8) -> Vec<Packet> {
        self.brightness_pct = pct.min(100);
        self.mode = LedMode::Static;
        color_packets(self.color, self.brightness_pct)
    }

    /// Switch effect mode.
    pub fn set_mode(&mut self, mode: LedMode) -> Vec<Packet> {
        self.mode = mode;
        match mode {
            // No off command: write the color at zero brightness.
            LedMode::Off => color_packets(self.color, 0),
            // Steady profile first, then a full-brightness color write to
            // give the firmware a known baseline for the cached color.
            LedMode::Static => {
                self.brightness_pct = 100;
                let mut packets = profile_packets(PROFILE_STEADY);
                packets.extend(color_packets(self.color, self.brightness_pct));
                packets
            }
            LedMode::Rainbow => profile_packets(PROFILE_RAINBOW),
            LedMode::Pulse => {
                self.pulse_phase = self.brightness_pct;
                self.pulse_rising = false;
                Vec::new()
            }
        }
    }

    /// Advance the pulse sweep one step. Outside Pulse this does nothing.
    pub fn pulse_tick(&mut self) -> Vec<Packet> {
        if self.mode != LedMode::Pulse {
            return Vec::new();
        }
        if self.pulse_rising {
            self.pulse_phase = self.pulse_phase.saturating_add(PULSE_STEP);
            if self.pulse_phase >= 100 {
                self.pulse_phase = 100;
                self.pulse_rising = false;
            }
        } else {
            self.pulse_phase = self.pulse_phase.saturating_sub(PULSE_STEP);
            if self.pulse_phase == 0 {
                self.pulse_rising = true;
            }
        }
        color_packets(self.color, self.pulse_phase)
    }
}

/// Shared lighting front end: the state machine plus a packet sink.
pub struct LightingController<S: PacketSink> {
    state: Arc<Mutex<LedState>>,
    sink: S,
}

impl<S: PacketSink + Clone> Clone for LightingController<S> {
    fn clone(&self) -> Self {
        LightingController { state: Arc::clone(&self.state), sink: self.sink.clone() }
    }
}

impl<S: PacketSink> LightingController<S> {
    pub fn new(sink: S) -> Self {
        LightingController { state: Arc::new(Mutex::new(LedState::default())), sink }
    }

    pub fn snapshot(&self) -> LedState {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    pub fn set_color(&mut self, color: Rgb) {
        let packets = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner).set_color(color);
        self.write_all(&packets);
    }

    pub fn set_brightness(&mut self, pct: u8) {
        let packets = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner).set_brightness(pct);
        self.write_all(&packets);
    }

    pub fn set_mode(&mut self, mode: LedMode) {
        let packets = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner).set_mode(mode);
        self.write_all(&packets);
    }

    fn tick_pulse(&mut self) {
        let packets = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner).pulse_tick();
        self.write_all(&packets);
    }

    /// The lock is already released here; device I/O never runs under it.
    fn write_all(&mut self, packets: &[Packet]) {
        for (index, packet) in packets.iter().enumerate() {
            if index > 0 {
                thread::sleep(INTER_PACKET_DELAY);
            }
            if let Err(error) = self.sink.write(packet) {
                warn!("lighting write failed: {error:#}");
                return;
            }
        }
    }
}

/// Drive the pulse sweep while the shared pulse flag is set.
pub fn spawn_pulse_loop<S>(mut controller: LightingController<S>, shared: Arc<SharedState>) -> JoinHandle<()>
where
    S: PacketSink + Send + 'static,
{
    thread::spawn(move || {
        while shared.is_running() {
            if shared.led_pulse_active() {
                controller.tick_pulse();
            }
            thread::sleep(PULSE_TICK);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Clone)]
    struct RecordingSink(Arc<Mutex<Vec<Packet>>>);

    impl PacketSink for RecordingSink {
        fn write(&mut self, packet: &Packet) -> Result<()> {
            self.0.lock().unwrap().push(*packet);
            Ok(())
        }
    }

    #[test]
    fn brightness_scaling_floors_onto_the_wire_range() {
        assert_eq!(brightness_byte(0), 0);
        assert_eq!(brightness_byte(50), 127);
        assert_eq!(brightness_byte(100), 255);
        assert_eq!(brightness_byte(140), 255);
    }

    #[test]
    fn static_color_writes_two_packets_differing_only_in_zone() {
        let mut state = LedState::default();
        state.brightness_pct = 50;
        let packets = state.set_color(Rgb::new(255, 0, 0));
        assert_eq!(packets.len(), 2);

        let (first, second) = (packets[0], packets[1]);
        assert_eq!(first[..4], [0x05, 0x0c, 0x72, 0x01]);
        assert_eq!(first[4], 0x03);
        assert_eq!(second[4], 0x04);
        assert_eq!(first[5], 0x01);
        assert_eq!(&first[6..10], &[255, 0, 0, 127]);
        assert_eq!(first[10..13], [0x00, 0x01, 0x01]);
        assert!(first[13..].iter().all(|&b| b == 0));
        for index in 0..PACKET_LEN {
            if index != 4 {
                assert_eq!(first[index], second[index], "byte {index} differs beyond the zone id");
            }
        }
    }

    #[test]
    fn profile_packets_use_their_own_zone_pair() {
        let mut state = LedState::default();
        let packets = state.set_mode(LedMode::Rainbow);
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0][..7], [0x05, 0x06, 0x73, 0x01, 0x00, 0x04, 0x01]);
        assert_eq!(packets[1][3], 0x02);
        assert!(packets[0][7..].iter().all(|&b| b == 0));
    }

    #[test]
    fn off_is_a_zero_brightness_color_write_preserving_the_color() {
        let mut state = LedState::default();
        state.set_color(Rgb::new(10, 20, 30));
        let packets = state.set_mode(LedMode::Off);
        assert_eq!(&packets[0][6..10], &[10, 20, 30, 0]);
        assert_eq!(state.color, Rgb::new(10, 20, 30));
        assert_eq!(state.mode, LedMode::Off);
    }

    #[test]
    fn static_mode_establishes_profile_then_full_brightness_baseline() {
        let mut state = LedState::default();
        state.set_color(Rgb::new(0, 128, 255));
        state.set_brightness(30);
        let packets = state.set_mode(LedMode::Static);
        assert_eq!(packets.len(), 4);
        assert_eq!(packets[0][2], 0x73);
        assert_eq!(packets[0][5], 0x01);
        assert_eq!(packets[2][2], 0x72);
        assert_eq!(packets[2][9], 255);
        assert_eq!(state.brightness_pct, 100);
    }

    #[test]
    fn manual_edits_leave_pulse_first() {
        let mut state = LedState::default();
        state.set_mode(LedMode::Pulse);
        assert_eq!(state.mode, LedMode::Pulse);

        state.set_brightness(40);
        assert_eq!(state.mode, LedMode::Static);

        state.set_mode(LedMode::Pulse);
        state.set_color(Rgb::new(1, 2, 3));
        assert_eq!(state.mode, LedMode::Static);
    }

    #[test]
    fn pulse_sweeps_down_then_bounces() {
        let mut state = LedState::default();
        state.set_brightness(8);
        state.set_mode(LedMode::Pulse);
        assert_eq!(state.pulse_phase, 8);

        assert!(!state.pulse_tick().is_empty());
        assert_eq!(state.pulse_phase, 4);
        state.pulse_tick();
        assert_eq!(state.pulse_phase, 0);
        state.pulse_tick();
        assert_eq!(state.pulse_phase, 4);

        // Ticking outside Pulse writes nothing.
        state.set_mode(LedMode::Off);
        assert!(state.pulse_tick().is_empty());
    }

    #[test]
    fn controller_routes_packets_through_the_sink() {
        let sink = RecordingSink::default();
        let written = sink.0.clone();
        let mut controller = LightingController::new(sink);
        controller.set_color(Rgb::new(255, 0, 0));
        let packets = written.lock().unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0][4], 0x03);
        assert_eq!(packets[1][4], 0x04);
    }
}
