// tests/settings_tests.rs
//! Settings, GPIO, EEPROM and NVRAM commands against the simulated bridge.

mod common;

use common::sim_device;
use dds_host::{
    AccessControl, BridgeSettings, ChipSettings, Error, GpioDirection, GpioLevel, GpioPin,
    InterruptMode, Password, PinDesignation, PowerOption, SettingsTarget, SpiMode,
    SpiTransferSettings, UsbKeySettings,
};

fn sample_spi() -> SpiTransferSettings {
    SpiTransferSettings {
        bit_rate: 3_000_000,
        idle_cs: 0x0003,
        active_cs: 0x0002,
        cs_to_data_delay: 10,
        last_data_to_cs_delay: 20,
        data_to_data_delay: 5,
        bytes_per_transaction: 7,
        mode: SpiMode::Mode3,
    }
}

fn sample_chip() -> ChipSettings {
    let mut pins = [PinDesignation::Gpio; 9];
    pins[1] = PinDesignation::ChipSelect;
    pins[5] = PinDesignation::Dedicated;
    ChipSettings {
        pins,
        default_output: 0x01F0,
        default_direction: 0x000F,
        remote_wakeup: true,
        interrupt_mode: InterruptMode::LowPulses,
        spi_bus_release: true,
        access_control: AccessControl::Unprotected,
        password: None,
    }
}

#[test]
fn test_spi_settings_both_targets() {
    let (mut dev, sim) = sim_device();
    for target in [SettingsTarget::Current, SettingsTarget::PowerUp] {
        dev.write_spi_settings(target, &sample_spi()).unwrap();
        assert_eq!(dev.read_spi_settings(target).unwrap(), sample_spi());
    }
    // Current uses 0x40/0x41, power-up uses NVRAM 0x60/0x61 with sub-command 0x10.
    let state = sim.state();
    assert_eq!(state.commands(), vec![0x40, 0x41, 0x60, 0x61]);
    assert_eq!(state.requests[2][1], 0x10);
    assert_eq!(state.requests[3][1], 0x10);
}

#[test]
fn test_spi_settings_write_is_idempotent() {
    let (mut dev, sim) = sim_device();
    dev.write_spi_settings(SettingsTarget::Current, &sample_spi()).unwrap();
    let first = sim.state().spi_current;
    dev.write_spi_settings(SettingsTarget::Current, &sample_spi()).unwrap();
    assert_eq!(sim.state().spi_current, first);
    let state = sim.state();
    assert_eq!(state.requests[0], state.requests[1]);
}

#[test]
fn test_chip_settings_both_targets() {
    let (mut dev, _sim) = sim_device();
    for target in [SettingsTarget::Current, SettingsTarget::PowerUp] {
        dev.write_chip_settings(target, &sample_chip()).unwrap();
        assert_eq!(dev.read_chip_settings(target).unwrap(), sample_chip());
    }
}

#[test]
fn test_invalid_designation_in_response() {
    let (mut dev, sim) = sim_device();
    sim.state().chip_current[6] = 0x03;
    assert!(matches!(
        dev.read_chip_settings(SettingsTarget::Current),
        Err(Error::InvalidReport(_))
    ));
}

#[test]
fn test_password_only_sent_with_power_up_write() {
    let (mut dev, sim) = sim_device();
    let mut chip = sample_chip();
    chip.access_control = AccessControl::Protected;
    chip.password = Some(Password::new("secret").unwrap());

    dev.write_chip_settings(SettingsTarget::Current, &chip).unwrap();
    assert_eq!(&sim.state().requests[0][19..27], &[0u8; 8]);

    dev.write_chip_settings(SettingsTarget::PowerUp, &chip).unwrap();
    assert_eq!(&sim.state().requests[1][19..27], b"secret\0\0");
    assert_eq!(sim.state().requests[1][18], 0x40);

    let read_back = dev.read_chip_settings(SettingsTarget::PowerUp).unwrap();
    assert_eq!(read_back.password, None);
    assert_eq!(read_back.access_control, AccessControl::Protected);
}

#[test]
fn test_send_password() {
    let (mut dev, sim) = sim_device();
    let mut chip = sample_chip();
    chip.password = Some(Password::new("letmein").unwrap());
    dev.write_chip_settings(SettingsTarget::PowerUp, &chip).unwrap();

    let err = dev.send_password(&Password::new("wrong").unwrap()).unwrap_err();
    assert_eq!(err.status(), Some(0xFB));
    assert_eq!(dev.chip_status().unwrap().password_attempts, 1);

    dev.send_password(&Password::new("letmein").unwrap()).unwrap();
    assert_eq!(&sim.state().requests.last().unwrap()[4..12], b"letmein\0");
    assert_eq!(dev.chip_status().unwrap().password_attempts, 0);
}

#[test]
fn test_gpio_pins() {
    let (mut dev, sim) = sim_device();
    let pin = GpioPin::new(3).unwrap();

    dev.gpio_set_direction(pin, GpioDirection::Output).unwrap();
    assert_eq!(sim.state().gpio_directions, 0x01F7);
    assert_eq!(dev.gpio_get_direction(pin).unwrap(), GpioDirection::Output);

    dev.gpio_write(pin, GpioLevel::Low).unwrap();
    assert_eq!(sim.state().gpio_values, 0x01F7);
    assert_eq!(dev.gpio_read(pin).unwrap(), GpioLevel::Low);
    dev.gpio_write(pin, GpioLevel::High).unwrap();
    assert_eq!(dev.gpio_read(pin).unwrap(), GpioLevel::High);

    // Unchanged direction is not rewritten.
    let before = sim.state().requests.len();
    dev.gpio_set_direction(pin, GpioDirection::Output).unwrap();
    assert_eq!(sim.state().commands()[before..], [0x33]);

    assert!(GpioPin::new(9).unwrap_err().is_validation());
}

#[test]
fn test_gpio_bulk_masks() {
    let (mut dev, sim) = sim_device();
    dev.write_gpio_values(0xFFAA).unwrap();
    assert_eq!(sim.state().gpio_values, 0x01AA);
    assert_eq!(dev.read_gpio_values().unwrap(), 0x01AA);
    dev.write_gpio_directions(0x0000).unwrap();
    assert_eq!(dev.read_gpio_directions().unwrap(), 0x0000);
}

#[test]
fn test_eeprom() {
    let (mut dev, sim) = sim_device();
    dev.write_eeprom(0x10, 0x5A).unwrap();
    dev.write_eeprom(0x11, 0xA5).unwrap();
    assert_eq!(dev.read_eeprom(0x10).unwrap(), 0x5A);

    let mut buf = [0u8; 3];
    dev.read_eeprom_range(0x0F, &mut buf).unwrap();
    assert_eq!(buf, [0xFF, 0x5A, 0xA5]);

    let mut too_long = [0u8; 2];
    let requests = sim.state().requests.len();
    assert!(dev
        .read_eeprom_range(0xFF, &mut too_long)
        .unwrap_err()
        .is_validation());
    assert_eq!(sim.state().requests.len(), requests);

    sim.state().status_override.insert(0x51, 0xFA);
    assert_eq!(dev.write_eeprom(0, 0).unwrap_err().status(), Some(0xFA));
}

#[test]
fn test_interrupt_counter() {
    let (mut dev, sim) = sim_device();
    sim.state().interrupt_count = 42;
    assert_eq!(dev.read_interrupt_count(false).unwrap(), 42);
    assert_eq!(sim.state().requests[0][1], 0xFF);
    assert_eq!(dev.read_interrupt_count(true).unwrap(), 42);
    assert_eq!(sim.state().requests[1][1], 0x00);
    assert_eq!(dev.read_interrupt_count(false).unwrap(), 0);
}

#[test]
fn test_usb_key_settings() {
    let (mut dev, sim) = sim_device();
    let defaults = dev.read_usb_key_settings().unwrap();
    assert_eq!(defaults.vid, 0x04D8);
    assert_eq!(defaults.pid, 0x00DE);
    assert_eq!(defaults.requested_current_ma, 100);
    assert!(defaults.power.host_powered());

    let wanted = UsbKeySettings {
        vid: 0x1234,
        pid: 0x5678,
        power: PowerOption::SELF_POWERED | PowerOption::REMOTE_WAKEUP,
        requested_current_ma: 500,
    };
    dev.write_usb_key_settings(&wanted).unwrap();
    assert_eq!(&sim.state().requests[1][4..10], &[0x34, 0x12, 0x78, 0x56, 0x60, 250]);
    assert_eq!(dev.read_usb_key_settings().unwrap(), wanted);

    let odd = UsbKeySettings {
        requested_current_ma: 101,
        ..wanted
    };
    let requests = sim.state().requests.len();
    assert!(dev.write_usb_key_settings(&odd).unwrap_err().is_validation());
    assert_eq!(sim.state().requests.len(), requests);
}

#[test]
fn test_descriptor_strings() {
    let (mut dev, _sim) = sim_device();
    assert_eq!(dev.read_product_name().unwrap(), "MCP2210 USB to SPI Master");
    assert_eq!(
        dev.read_manufacturer_name().unwrap(),
        "Microchip Technology Inc."
    );

    dev.write_product_name("DDS host").unwrap();
    dev.write_manufacturer_name("").unwrap();
    assert_eq!(dev.read_product_name().unwrap(), "DDS host");
    assert_eq!(dev.read_manufacturer_name().unwrap(), "");

    assert!(dev
        .write_product_name("a name that is far too long to fit")
        .unwrap_err()
        .is_validation());
}

#[test]
fn test_bridge_settings_from_entries() {
    let mut settings = BridgeSettings::default();
    for (section, key, value) in [
        ("SPI", "bit_rate", "3000000"),
        ("SPI", "cs_idle_0", "1"),
        ("SPI", "cs_idle_1", "1"),
        ("SPI", "cs_active_1", "0"),
        ("SPI", "spi_mode", "mode3"),
        ("SPI", "bytes_per_transaction", "7"),
        ("CHIP", "gp1", "cs"),
        ("CHIP", "gp5", "dedicated"),
        ("CHIP", "gp2_dir", "in"),
        ("CHIP", "gp2_out", "high"),
        ("CHIP", "interrupt_mode", "low_pulses"),
        ("USB", "request_current", "500"),
        ("USB", "vid", "0x1234"),
    ] {
        settings
            .apply_setting(section, key, value)
            .unwrap_or_else(|e| panic!("[{}] {} = {}: {}", section, key, value, e));
    }
    assert_eq!(settings.spi.bit_rate, 3_000_000);
    assert_eq!(settings.spi.idle_cs, 0x0003);
    assert_eq!(settings.spi.mode, SpiMode::Mode3);
    assert_eq!(settings.chip.pins[1], PinDesignation::ChipSelect);
    assert_eq!(settings.chip.pins[5], PinDesignation::Dedicated);
    assert_eq!(settings.chip.default_direction, 0x0004);
    assert_eq!(settings.chip.default_output, 0x0004);
    assert_eq!(settings.chip.interrupt_mode, InterruptMode::LowPulses);
    assert_eq!(settings.usb.requested_current_ma, 500);
    assert_eq!(settings.usb.vid, 0x1234);

    // Applied settings go to the chip unchanged.
    let (mut dev, _sim) = sim_device();
    dev.write_spi_settings(SettingsTarget::Current, &settings.spi)
        .unwrap();
    dev.write_chip_settings(SettingsTarget::Current, &settings.chip)
        .unwrap();
    assert_eq!(
        dev.read_spi_settings(SettingsTarget::Current).unwrap(),
        settings.spi
    );
    assert_eq!(
        dev.read_chip_settings(SettingsTarget::Current).unwrap(),
        settings.chip
    );
}

#[test]
fn test_rejected_entries() {
    let mut settings = BridgeSettings::default();
    for (section, key, value) in [
        ("CHIP", "gp9", "gpio"),
        ("CHIP", "gp0", "3"),
        ("SPI", "spi_mode", "4"),
        ("SPI", "cs_idle_0", "2"),
        ("USB", "request_current", "511"),
        ("CHIP", "password", "toolongpw"),
        ("NOPE", "key", "1"),
        ("CHIP", "gé", "0"),
        ("SPI", "cs_idle_ü", "1"),
    ] {
        assert!(
            matches!(
                settings.apply_setting(section, key, value),
                Err(Error::InvalidSetting { .. })
            ),
            "[{}] {} = {}",
            section,
            key,
            value
        );
    }
    assert_eq!(settings, BridgeSettings::default());
}

#[test]
fn test_entries_applied_on_top_of_device_settings() {
    let (mut dev, sim) = sim_device();
    let current = BridgeSettings {
        spi: dev.read_spi_settings(SettingsTarget::Current).unwrap(),
        chip: dev.read_chip_settings(SettingsTarget::Current).unwrap(),
        usb: dev.read_usb_key_settings().unwrap(),
    };
    let mut settings = current;
    settings.apply_setting("CHIP", "gp6_dir", "in").unwrap();
    assert_eq!(settings.spi, current.spi);
    assert_eq!(settings.usb, current.usb);

    dev.write_chip_settings(SettingsTarget::Current, &settings.chip)
        .unwrap();
    let chip = dev.read_chip_settings(SettingsTarget::Current).unwrap();
    // Chip selects the converter and SRAM depend on survive the update.
    assert_eq!(chip.pins[0], PinDesignation::ChipSelect);
    assert_eq!(chip.pins[1], PinDesignation::ChipSelect);
    assert_eq!(chip.default_direction, current.chip.default_direction | 1 << 6);
    assert_eq!(sim.state().spi_current[4..8], 12_000_000u32.to_le_bytes());
}
