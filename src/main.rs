//! RFM69 RSSI Meter Main Application
//!
//! Startup stage, then one of two service loops selected at build time:
//! the receiver meters incoming beacons, the transmitter sends them.

#![no_std]
#![no_main]

use defmt::{error, info, warn};
use embassy_executor::Spawner;
use embassy_futures::join::join;
use embassy_stm32::gpio::{Input, Level, Output, OutputType, Pull, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::peripherals::TIM2;
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::usb::Driver;
use embassy_stm32::{bind_interrupts, peripherals, usb};
use embassy_time::Ticker;
use embassy_usb::class::cdc_acm::CdcAcmClass;
use embassy_usb::UsbDevice;
use {defmt_rtt as _, panic_probe as _};

use rssi_meter::drivers::display::Display;
use rssi_meter::drivers::rfm69::{Rfm69, Rfm69Error};
use rssi_meter::hal::gpio::{Button, StatusLed};
use rssi_meter::hal::i2c::I2cAddress;
use rssi_meter::hal::pwm::{DutyCycle, LedDimmer};
use rssi_meter::hal::spi::RadioSpi;
use rssi_meter::hal::timer::{uptime_ms, Stopwatch};
use rssi_meter::prelude::*;
use rssi_meter::radio::interlock::{lockout_led_on, InterlockState, PowerOnInterlock};
use rssi_meter::radio::meter::MeterScale;
use rssi_meter::radio::receiver::ReceiverService;
use rssi_meter::radio::service::{FailureStreak, Reaction};
use rssi_meter::radio::transmitter::TransmitterService;
use rssi_meter::ui::{self, DisplayBuffer};
use rssi_meter::usb::cdc::{self, LineChannel, SerialWriter, UsbDriver};

bind_interrupts!(struct Irqs {
    I2C1_EV => embassy_stm32::i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => embassy_stm32::i2c::ErrorInterruptHandler<peripherals::I2C1>;
    USB_LP => usb::InterruptHandler<peripherals::USB>;
});

static SERIAL_LINES: LineChannel = LineChannel::new();

/// Everything the service loops drive
struct Outputs<'d> {
    meter: LedDimmer<'d, TIM2>,
    error: StatusLed<'d>,
    status: StatusLed<'d>,
    display: Option<Display<'d>>,
    serial: SerialWriter,
}

impl Outputs<'_> {
    /// Apply a reaction; `draw` renders the current screen when a redraw is requested
    async fn apply(&mut self, reaction: Reaction, draw: impl FnOnce(&mut DisplayBuffer)) {
        if let Some(duty) = reaction.meter_led {
            self.meter.set(DutyCycle::from_raw(duty));
        }
        if let Some(on) = reaction.error_led {
            self.error.set(on);
        }
        if let Some(on) = reaction.status_led {
            self.status.set(on);
        }
        if let Some(line) = &reaction.line {
            if !self.serial.emit(line) {
                warn!("Serial queue full, line dropped");
            }
        }
        if reaction.redraw {
            if let Some(display) = self.display.as_mut() {
                draw(display.buffer_mut());
                if display.flush().await.is_err() {
                    warn!("Display flush failed");
                }
            }
        }
    }
}

fn clock_config() -> embassy_stm32::Config {
    use embassy_stm32::rcc::{
        mux, Hsi48Config, Pll, PllMul, PllPreDiv, PllRDiv, PllSource, Sysclk,
    };

    let mut config = embassy_stm32::Config::default();
    // 16 MHz HSI / 4 * 85 / 2 = 170 MHz
    config.rcc.pll = Some(Pll {
        source: PllSource::HSI,
        prediv: PllPreDiv::DIV4,
        mul: PllMul::MUL85,
        divp: None,
        divq: None,
        divr: Some(PllRDiv::DIV2),
    });
    config.rcc.sys = Sysclk::PLL1_R;
    config.rcc.boost = true;
    config.rcc.hsi48 = Some(Hsi48Config {
        sync_from_usb: true,
    });
    config.rcc.mux.clk48sel = mux::Clk48sel::HSI48;
    config
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("RSSI Meter Firmware v{} ({})", env!("CARGO_PKG_VERSION"), ROLE);

    let p = embassy_stm32::init(clock_config());
    info!("Peripherals initialized at {} Hz", SYSTEM_CLOCK_HZ);

    // Indicator LEDs start dark
    let pwm = SimplePwm::new(
        p.TIM2,
        Some(PwmPin::new_ch1(p.PA5, OutputType::PushPull)),
        None,
        None,
        None,
        Hertz(LED_PWM_HZ),
        CountingMode::EdgeAlignedUp,
    );
    let mut meter = LedDimmer::new(pwm.split().ch1);
    meter.off();
    let error_led = StatusLed::new(Output::new(p.PC0, Level::Low, Speed::Low));
    let mut status_led = StatusLed::new(Output::new(p.PC1, Level::Low, Speed::Low));
    let button_a = Button::new(Input::new(p.PC2, Pull::Up));
    let mut button_b = Button::new(Input::new(p.PC3, Pull::Up));

    // Interlock runs before any RF hardware is touched
    let mut interlock = PowerOnInterlock::new(INTERLOCK_SAMPLES);
    let state = loop {
        let held = button_a.is_held() || button_b.is_held();
        match interlock.sample(held) {
            InterlockState::Pending => Timer::after_millis(INTERLOCK_SAMPLE_MS).await,
            decided => break decided,
        }
    };
    info!("Interlock: {}", state);
    if state == InterlockState::Locked {
        lockout(&mut status_led).await;
    }

    // Display
    let i2c = I2c::new(
        p.I2C1,
        p.PB8,
        p.PB9,
        Irqs,
        p.DMA1_CH1,
        p.DMA1_CH2,
        Hertz(I2C_FREQUENCY_HZ),
        Default::default(),
    );
    let mut display = Display::new(i2c);
    let display = if !display.is_present().await {
        warn!("No display at {}, running headless", I2cAddress::SSD1306);
        None
    } else {
        match display.init().await {
            Ok(()) => {
                ui::render_boot_screen(display.buffer_mut(), ROLE, DEFAULT_FREQUENCY);
                if display.flush().await.is_err() {
                    warn!("Display flush failed");
                }
                info!("Display initialized");
                Some(display)
            }
            Err(_) => {
                warn!("Display init failed, running headless");
                None
            }
        }
    };

    // Lines queue from here on; the USB task drains them once it runs
    let mut outputs = Outputs {
        meter,
        error: error_led,
        status: status_led,
        display,
        serial: SerialWriter::new(&SERIAL_LINES),
    };

    // Radio
    let config = match RadioConfig::from_constants() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid radio configuration: {}", e);
            fault(&mut outputs, "bad config").await
        }
    };

    let mut spi_config = spi::Config::default();
    spi_config.frequency = Hertz(SPI_FREQUENCY_HZ);
    let spi = Spi::new(p.SPI1, p.PB3, p.PB5, p.PB4, p.DMA1_CH3, p.DMA1_CH4, spi_config);
    let cs = Output::new(p.PA4, Level::High, Speed::VeryHigh);
    let reset = Output::new(p.PA8, Level::Low, Speed::Low);
    let mut radio = Rfm69::new(RadioSpi::new(spi, cs), reset, config.power);

    radio.reset().await;
    if let Err(e) = radio.init().await {
        error!("RFM69 init failed: {}", e);
        fault(&mut outputs, e.reason()).await;
    }
    if let Err(e) = radio.configure(&config).await {
        error!("RFM69 configure failed: {}", e);
        fault(&mut outputs, e.reason()).await;
    }
    info!(
        "RFM69 at {} Hz, {} dBm, key {}",
        config.frequency.as_hz(),
        config.power.dbm(),
        config.key.is_some()
    );

    // Serial debug channel
    let driver = Driver::new(p.USB, Irqs, p.PA12, p.PA11);
    let (usb_dev, class) = cdc::build(driver);
    spawner.must_spawn(usb_task(usb_dev, class));

    match ROLE {
        Role::Receiver => receiver_loop(radio, &mut outputs, &mut button_b, &config).await,
        Role::Transmitter => transmitter_loop(radio, &mut outputs, &config).await,
    }
}

/// Flash the status LED forever; the radio is never enabled
async fn lockout(led: &mut StatusLed<'_>) -> ! {
    warn!("Button held at power-on, radio disabled");
    let clock = Stopwatch::started();
    loop {
        led.set(lockout_led_on(clock.elapsed_ms(), LOCKOUT_FLASH_MS));
        Timer::after_millis(LOCKOUT_FLASH_MS).await;
    }
}

/// Show the fault and blink the error LED forever
async fn fault(outputs: &mut Outputs<'_>, reason: &str) -> ! {
    outputs.meter.off();
    if let Some(display) = outputs.display.as_mut() {
        ui::render_fault_screen(display.buffer_mut(), reason);
        if display.flush().await.is_err() {
            warn!("Display flush failed");
        }
    }
    loop {
        outputs.error.toggle();
        Timer::after_millis(LOCKOUT_FLASH_MS).await;
    }
}

async fn receiver_loop(
    mut radio: Rfm69<'_>,
    outputs: &mut Outputs<'_>,
    button_b: &mut Button<'_>,
    config: &RadioConfig,
) -> ! {
    let scale = MeterScale::DEFAULT;
    let mut service = ReceiverService::new(config.frequency, uptime_ms());
    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));

    if let Err(e) = radio.start_receive().await {
        error!("RFM69 failed to enter RX: {}", e);
        fault(outputs, e.reason()).await;
    }
    let mut poll_failures = FailureStreak::new(RADIO_MAX_POLL_FAILURES);
    let view = service.view();
    outputs
        .apply(Reaction { redraw: true, ..Reaction::none() }, |buf| {
            ui::render_meter_screen(buf, &view, &scale);
        })
        .await;
    info!("Receiver loop running");

    loop {
        let available = radio.available().await;
        match available {
            Ok(_) => poll_failures.succeed(),
            Err(e) => {
                if poll_failures.fail() {
                    error!("RFM69 poll failed {} times in a row: {}", poll_failures.count(), e);
                    fault(outputs, e.reason()).await;
                }
                warn!("RFM69 poll failed: {}", e);
            }
        }

        if let Ok(true) = available {
            let outcome = match radio.receive().await {
                Ok(rx) => Some(Ok(rx)),
                Err(Rfm69Error::Frame(e)) => Some(Err(e)),
                Err(e) => {
                    error!("RFM69 receive failed: {}", e);
                    None
                }
            };
            if let Some(outcome) = outcome {
                let reaction = service.on_frame(uptime_ms(), outcome);
                let view = service.view();
                outputs
                    .apply(reaction, |buf| ui::render_meter_screen(buf, &view, &scale))
                    .await;
            }
        }

        if button_b.update() {
            info!("Statistics window reset");
            let reaction = service.on_reset_button(uptime_ms());
            let view = service.view();
            outputs
                .apply(reaction, |buf| ui::render_meter_screen(buf, &view, &scale))
                .await;
        }

        let reaction = service.on_tick(uptime_ms());
        if !reaction.is_empty() {
            let view = service.view();
            outputs
                .apply(reaction, |buf| ui::render_meter_screen(buf, &view, &scale))
                .await;
        }

        ticker.next().await;
    }
}

async fn transmitter_loop(
    mut radio: Rfm69<'_>,
    outputs: &mut Outputs<'_>,
    config: &RadioConfig,
) -> ! {
    let mut service = TransmitterService::new(
        config.frequency,
        config.power,
        config.address,
        config.destination,
        uptime_ms(),
    );
    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));
    info!("Transmitter loop running");

    loop {
        if let Some(frame) = service.poll(uptime_ms()) {
            let outcome = radio.send(&frame).await.map_err(|e| {
                error!("RFM69 send failed: {}", e);
                e.reason()
            });
            let reaction = service.on_sent(uptime_ms(), outcome);
            let view = service.view();
            outputs
                .apply(reaction, |buf| ui::render_transmit_screen(buf, &view))
                .await;
        }

        let reaction = service.on_tick(uptime_ms());
        if !reaction.is_empty() {
            let view = service.view();
            outputs
                .apply(reaction, |buf| ui::render_transmit_screen(buf, &view))
                .await;
        }

        ticker.next().await;
    }
}

/// USB device plus serial line pump
#[embassy_executor::task]
async fn usb_task(
    mut usb: UsbDevice<'static, UsbDriver>,
    mut class: CdcAcmClass<'static, UsbDriver>,
) {
    let serial = async {
        loop {
            class.wait_connection().await;
            let baud = class.line_coding().data_rate();
            info!("Serial host connected ({} baud, expected {})", baud, SERIAL_BAUD);
            let _ = cdc::pump(&mut class, &SERIAL_LINES).await;
            info!("Serial host disconnected");
        }
    };
    join(usb.run(), serial).await;
}
