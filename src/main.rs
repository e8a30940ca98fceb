#![windows_subsystem = "windows"]

mod messaging;
mod power;
mod system;
mod ui;
mod utils;

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use eframe::egui;

use liblegion::display::{
    self, DisplayController, GdiRefresh, RefreshRate, REFRESH_CONFIRM_COOLDOWN,
};
use liblegion::input::{button, gamepad, mouse::SystemPointer, touchpad};
use liblegion::lighting::{spawn_pulse_loop, HidPacketSink, LightingController};
use liblegion::mgmt::WmiClient;
use liblegion::registry;
use liblegion::state::{event_channel, CoreEvent, EventSender, SharedState, DEFAULT_SENSITIVITY};
use liblegion::thermal::ThermalController;
use liblegion::types::{InputMode, LedMode, ThermalProfile, ThermalStatus, MIN_CUSTOM_WATTS};

use messaging::MessageCenter;
use power::BatteryStatus;
use system::SystemSpecs;
use ui::display::DisplayAction;
use ui::footer::FooterAction;
use ui::input::InputAction;
use ui::thermal::ThermalAction;
use utils::{beep, thermal_beep_frequency};

/// Cadence of the slow hardware re-polls (profile read-back, CPU temp,
/// battery, brightness drift). The underlying interfaces offer no change
/// notification, so this is cooperative polling.
const TELEMETRY_INTERVAL: Duration = Duration::from_secs(3);

/// Results posted back by the shell's own background reads.
#[derive(Debug, Clone)]
enum ShellUpdate {
    SpecsLoaded(SystemSpecs),
    InitialReadings { brightness: Option<u8>, refresh_hz: u32 },
    Telemetry { thermal: ThermalStatus, cpu_temp: Option<f64>, battery: BatteryStatus },
}

struct GoHelperApp {
    shared: Arc<SharedState>,
    core_events: Receiver<CoreEvent>,
    event_tx: EventSender,
    thermal: ThermalController<WmiClient>,
    display: DisplayController<WmiClient>,
    lighting: LightingController<HidPacketSink>,

    specs: SystemSpecs,
    thermal_status: ThermalStatus,
    custom_watts: u32,
    refresh_hz: u32,
    refresh_pending: bool,
    refresh_task: Option<JoinHandle<()>>,
    brightness_pct: u8,
    sensitivity: u32,
    input_mode: InputMode,
    led_mode: LedMode,
    led_color: [u8; 3],
    led_brightness: u8,
    battery: BatteryStatus,
    cpu_temp: String,
    autostart: bool,
    visible: bool,
    should_quit: bool,

    messages: MessageCenter,
    updates_rx: Receiver<ShellUpdate>,
    updates_tx: Sender<ShellUpdate>,
    last_telemetry: Instant,
}

impl GoHelperApp {
    fn new() -> Self {
        let shared = Arc::new(SharedState::new());
        let (event_tx, core_events) = event_channel();
        let (updates_tx, updates_rx) = mpsc::channel();

        let thermal = ThermalController::new(WmiClient::new());
        let display_ctl = DisplayController::new(WmiClient::new());
        let lighting = LightingController::new(HidPacketSink);

        // The always-on loops. They stop cooperatively via the running flag
        // and are never joined.
        button::spawn_listener(Arc::clone(&shared), event_tx.clone());
        touchpad::spawn_tracker(Arc::clone(&shared), SystemPointer);
        gamepad::spawn_gamepad_loop(Arc::clone(&shared), SystemPointer);
        spawn_pulse_loop(lighting.clone(), Arc::clone(&shared));

        // Balanced on startup, as always.
        {
            let thermal = thermal.clone();
            thread::spawn(move || thermal.apply_profile(ThermalProfile::Balanced));
        }

        // Slow firmware reads stay off the UI thread; results arrive as updates.
        {
            let updates = updates_tx.clone();
            let display_ctl = display_ctl.clone();
            thread::spawn(move || {
                let mgmt = WmiClient::new();
                let _ = updates.send(ShellUpdate::SpecsLoaded(system::get_system_specs(&mgmt)));
                let _ = updates.send(ShellUpdate::InitialReadings {
                    brightness: display_ctl.brightness_pct(),
                    refresh_hz: GdiRefresh.current(),
                });
            });
        }

        let mut app = Self {
            shared,
            core_events,
            event_tx,
            thermal,
            display: display_ctl,
            lighting,
            specs: SystemSpecs::default(),
            thermal_status: ThermalStatus::Balanced,
            custom_watts: MIN_CUSTOM_WATTS,
            refresh_hz: 60,
            refresh_pending: false,
            refresh_task: None,
            brightness_pct: 50,
            sensitivity: DEFAULT_SENSITIVITY,
            input_mode: InputMode::Analog,
            led_mode: LedMode::Off,
            led_color: [255, 255, 255],
            led_brightness: 100,
            battery: BatteryStatus { ac_power: true, percent: None },
            cpu_temp: system::specs::format_cpu_temperature(None),
            autostart: registry::autostart_enabled(),
            visible: true,
            should_quit: false,
            messages: MessageCenter::new(),
            updates_rx,
            updates_tx,
            last_telemetry: Instant::now(),
        };
        app.messages.info("Initializing…");
        app
    }

    // ========================================================================
    // Background results and core events
    // ========================================================================

    fn process_updates(&mut self) {
        while let Ok(update) = self.updates_rx.try_recv() {
            match update {
                ShellUpdate::SpecsLoaded(specs) => {
                    self.specs = specs;
                }
                ShellUpdate::InitialReadings { brightness, refresh_hz } => {
                    if let Some(pct) = brightness {
                        self.brightness_pct = pct;
                    }
                    self.refresh_hz = refresh_hz;
                    self.messages.info("Ready");
                }
                ShellUpdate::Telemetry { thermal, cpu_temp, battery } => {
                    self.thermal_status = thermal;
                    self.cpu_temp = system::specs::format_cpu_temperature(cpu_temp);
                    self.battery = battery;
                }
            }
        }
    }

    fn process_core_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.core_events.try_recv() {
            match event {
                CoreEvent::HardwareButtonPressed => {
                    let visible = !self.visible;
                    self.set_visible(ctx, visible);
                }
                CoreEvent::RefreshRateConfirmed(hz) => {
                    self.refresh_hz = hz;
                    self.refresh_pending = false;
                    self.refresh_task = None;
                    self.messages.info(format!("Screen mode confirmed at {hz}Hz"));
                }
                CoreEvent::BrightnessDrifted(pct) => {
                    self.brightness_pct = pct;
                }
            }
        }
    }

    fn tick_telemetry(&mut self) {
        if self.last_telemetry.elapsed() < TELEMETRY_INTERVAL {
            return;
        }
        self.last_telemetry = Instant::now();

        let updates = self.updates_tx.clone();
        let thermal = self.thermal.clone();
        thread::spawn(move || {
            let _ = updates.send(ShellUpdate::Telemetry {
                thermal: thermal.query_profile(),
                cpu_temp: system::specs::get_cpu_temperature(&WmiClient::new()),
                battery: power::get_battery_status()
                    .unwrap_or(BatteryStatus { ac_power: true, percent: None }),
            });
        });

        // Hardware brightness keys move the panel without telling us; the
        // drift poll answers through the core event queue.
        let _ = display::poll_brightness_drift(
            self.display.clone(),
            self.brightness_pct,
            self.event_tx.clone(),
        );
    }

    fn set_visible(&mut self, ctx: &egui::Context, visible: bool) {
        self.visible = visible;
        ctx.send_viewport_cmd(egui::ViewportCommand::Visible(visible));
        if visible {
            ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
        }
    }

    fn beep_unless_muted(&self, frequency: u32) {
        if !self.shared.is_muted() {
            beep(frequency);
        }
    }

    // ========================================================================
    // Commands into the core
    // ========================================================================

    fn set_thermal_profile(&mut self, profile: ThermalProfile) {
        // The apply chain blocks on the management service; keep it off the
        // UI thread.
        let muted = self.shared.is_muted();
        let thermal = self.thermal.clone();
        thread::spawn(move || {
            thermal.apply_profile(profile);
            if !muted {
                beep(thermal_beep_frequency(profile.fan_mode_id()));
            }
        });
        self.thermal_status = ThermalStatus::from_fan_mode(profile.fan_mode_id());
        self.messages.info(format!("Thermal mode: {}", self.thermal_status));
    }

    fn handle_thermal_action(&mut self, action: ThermalAction) {
        match action {
            ThermalAction::None => {}
            ThermalAction::SetProfile(status) => {
                let profile = match status {
                    ThermalStatus::Quiet => ThermalProfile::Quiet,
                    ThermalStatus::Balanced => ThermalProfile::Balanced,
                    ThermalStatus::Performance => ThermalProfile::Performance,
                    ThermalStatus::Custom | ThermalStatus::Unknown => {
                        // Entering Custom always starts from the floor.
                        self.custom_watts = MIN_CUSTOM_WATTS;
                        ThermalProfile::custom(self.custom_watts)
                    }
                };
                self.set_thermal_profile(profile);
            }
            ThermalAction::SetWatts(watts) => {
                if self.thermal_status == ThermalStatus::Custom {
                    self.custom_watts = watts;
                    self.set_thermal_profile(ThermalProfile::custom(watts));
                }
            }
        }
    }

    fn handle_input_action(&mut self, action: InputAction) {
        match action {
            InputAction::None => {}
            InputAction::SetMode(mode) => {
                self.shared.set_input_mode(mode);
                self.input_mode = mode;
                self.beep_unless_muted(700);
                self.messages.info(format!("Controller mode: {mode}"));
            }
            InputAction::SetSensitivity(value) => {
                self.shared.set_sensitivity(value);
                self.sensitivity = self.shared.sensitivity();
            }
        }
    }

    fn handle_display_action(&mut self, action: DisplayAction) {
        match action {
            DisplayAction::None => {}
            DisplayAction::ToggleRefreshRate => {
                let target = if self.refresh_hz > 100 { 60 } else { 144 };
                // Show the requested rate immediately; the confirm re-read
                // after the cooldown settles what actually took.
                self.refresh_hz = target;
                self.refresh_pending = true;
                self.beep_unless_muted(600);
                self.refresh_task = Some(display::apply_refresh_rate(
                    GdiRefresh,
                    target,
                    REFRESH_CONFIRM_COOLDOWN,
                    self.event_tx.clone(),
                ));
            }
            DisplayAction::SetBrightness(pct) => {
                self.brightness_pct = pct;
                let display_ctl = self.display.clone();
                thread::spawn(move || display_ctl.set_brightness_pct(pct));
            }
        }
    }

    fn handle_lighting_action(&mut self, action: ui::lighting::LightingAction) {
        if let Some(mode) = action.mode {
            self.led_mode = mode;
            self.shared.set_led_pulse_active(mode == LedMode::Pulse);
            if mode == LedMode::Static {
                // The mode switch re-establishes the full-brightness baseline.
                self.led_brightness = 100;
            }
            let mut lighting = self.lighting.clone();
            thread::spawn(move || lighting.set_mode(mode));
            self.messages.info(format!("Lighting: {mode}"));
        }
        if let Some(color) = action.color {
            // Manual edits take the brightness away from the pulse loop.
            self.shared.set_led_pulse_active(false);
            self.led_mode = LedMode::Static;
            let mut lighting = self.lighting.clone();
            thread::spawn(move || lighting.set_color(color));
        }
        if let Some(pct) = action.brightness {
            self.shared.set_led_pulse_active(false);
            self.led_mode = LedMode::Static;
            self.led_brightness = pct;
            let mut lighting = self.lighting.clone();
            thread::spawn(move || lighting.set_brightness(pct));
        }
    }

    fn handle_footer_action(&mut self, action: FooterAction) {
        match action {
            FooterAction::None => {}
            FooterAction::ToggleMute => {
                let muted = !self.shared.is_muted();
                self.shared.set_muted(muted);
            }
            FooterAction::ToggleAutostart => match registry::set_autostart(!self.autostart) {
                Ok(()) => {
                    self.autostart = !self.autostart;
                    self.messages.info(if self.autostart {
                        "Starting with Windows"
                    } else {
                        "Autostart removed"
                    });
                }
                Err(error) => self.messages.error(format!("Autostart change failed: {error:#}")),
            },
            FooterAction::DisableGameBar => match registry::disable_game_bar() {
                Ok(()) => self.messages.info("Game Bar capture disabled. Restart recommended."),
                Err(error) => self.messages.error(format!("Game Bar change failed: {error:#}")),
            },
            FooterAction::Quit => {
                self.should_quit = true;
            }
        }
    }
}

impl eframe::App for GoHelperApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Keep update() ticking even while hidden so the hardware button and
        // the core event queue stay serviced.
        ctx.request_repaint_after(Duration::from_millis(100));

        self.messages.tick();
        self.process_updates();
        self.process_core_events(ctx);
        self.tick_telemetry();

        if self.should_quit {
            self.shared.shutdown();
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        // The title-bar close hides to the background; Exit quits for real.
        if ctx.input(|i| i.viewport().close_requested()) {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.set_visible(ctx, false);
        }

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            let action = ui::footer::render_footer(
                ui,
                &self.battery.describe(),
                self.shared.is_muted(),
                self.autostart,
            );
            self.handle_footer_action(action);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui::header::render_header(
                ui,
                ctx,
                &self.specs.device_model,
                &self.cpu_temp,
                &self.messages,
            );
            ui.separator();

            let action =
                ui::thermal::render_thermal_section(ui, self.thermal_status, &mut self.custom_watts);
            self.handle_thermal_action(action);
            ui.separator();

            let action =
                ui::input::render_input_section(ui, self.input_mode, &mut self.sensitivity);
            self.handle_input_action(action);
            ui.separator();

            let action = ui::display::render_display_section(
                ui,
                self.refresh_hz,
                self.refresh_pending,
                &mut self.brightness_pct,
            );
            self.handle_display_action(action);
            ui.separator();

            let action = ui::lighting::render_lighting_section(
                ui,
                self.led_mode,
                &mut self.led_color,
                &mut self.led_brightness,
            );
            self.handle_lighting_action(action);
        });
    }
}

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("starting GO-Helper v{}", env!("CARGO_PKG_VERSION"));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([430.0, 540.0])
            .with_resizable(false)
            .with_title("GO-Helper")
            .with_always_on_top()
            .with_active(true),
        ..Default::default()
    };

    eframe::run_native("GO-Helper", options, Box::new(|_cc| Ok(Box::new(GoHelperApp::new()))))
}
