// tests/hardware_tests.rs
//
// These tests need an MCP2210 on the USB bus. Run with `cargo test -- --ignored`.
// The EEPROM tests overwrite the first bytes of the user EEPROM.
use hidapi::HidApi;
use mcp2210_hid::{Error, GpioDirection, GpioLevel, GpioPin, Mcp2210, Result};

// Helper to open the first device, panics on failure for test simplicity
fn open_test_device() -> Mcp2210 {
    let _ = env_logger::builder().is_test(true).try_init();
    let hid_api = HidApi::new().expect("Failed to create HID API");
    Mcp2210::open_first(&hid_api)
        .expect("Failed to open MCP2210. Is it connected and permissions set?")
}

#[test]
#[ignore] // Ignore by default, requires hardware
fn test_open_by_vid_pid() -> Result<()> {
    let hid_api = HidApi::new()?;
    let device = Mcp2210::open_by_vid_pid(&hid_api, 0x04D8, 0x00DE)?;
    println!("Opened: {:?}", device);
    Ok(())
}

#[test]
#[ignore] // Ignore by default, requires hardware
fn test_open_invalid_vid_pid_fails() {
    let hid_api = HidApi::new().expect("Failed to create HID API");
    assert!(matches!(
        Mcp2210::open_by_vid_pid(&hid_api, 0xFFFF, 0x0FFF),
        Err(Error::DeviceNotFound)
    ));
}

#[test]
#[ignore] // Ignore by default, requires hardware
fn test_open_by_path() -> Result<()> {
    let hid_api = HidApi::new()?;
    let devices = mcp2210_hid::device_find_all(&hid_api);
    let info = devices.first().ok_or(Error::DeviceNotFound)?;
    let mut device = Mcp2210::open_by_path(&hid_api, &info.path)?;
    println!("Product: {}", device.product_name()?);
    Ok(())
}

// --- EEPROM (WARNING: overwrites values!) ---

#[test]
#[ignore] // Ignore by default, requires hardware
fn test_eeprom_read_slice() -> Result<()> {
    let mut device = open_test_device();
    let values = device.eeprom().read_range(0..4)?;
    assert_eq!(values.len(), 4);
    Ok(())
}

#[test]
#[ignore] // Ignore by default, requires hardware
fn test_eeprom_write_single() -> Result<()> {
    let mut device = open_test_device();
    let value = device.eeprom().read(0)?.wrapping_add(1);
    device.eeprom().write(0, value)?;
    assert_eq!(device.eeprom().read(0)?, value);
    Ok(())
}

#[test]
#[ignore] // Ignore by default, requires hardware
fn test_eeprom_write_slice() -> Result<()> {
    let mut device = open_test_device();
    let values: Vec<u8> = device
        .eeprom()
        .read_range(0..4)?
        .into_iter()
        .map(|v| v.wrapping_add(1))
        .collect();
    device.eeprom().write_range(0, &values)?;
    assert_eq!(device.eeprom().read_range(0..4)?, values);
    Ok(())
}

#[test]
#[ignore] // Ignore by default, requires hardware
fn test_eeprom_readme_example() -> Result<()> {
    let mut device = open_test_device();
    device.eeprom().write_range(10, &[2, 4, 8, 16])?;
    assert_eq!(device.eeprom().read_range(10..14)?, [2, 4, 8, 16]);
    assert_eq!(device.eeprom().read(12)?, 8);
    Ok(())
}

// --- SPI ---

#[test]
#[ignore] // Ignore by default, requires hardware (MOSI looped back to MISO)
fn test_spi_loopback() -> Result<()> {
    let mut device = open_test_device();
    let tx: Vec<u8> = (0..130u8).collect();
    let rx = device.spi_transfer(&tx)?;
    assert_eq!(rx.len(), tx.len());
    assert_eq!(rx, tx, "MOSI must be wired to MISO");
    Ok(())
}

// --- GPIO ---

#[test]
#[ignore] // Ignore by default, requires hardware (GP0 designated as GPIO)
fn test_gpio_output_readback() -> Result<()> {
    let mut device = open_test_device();
    let pin = GpioPin::new(0)?;

    device.gpio_set_direction(pin, GpioDirection::Output)?;
    device.gpio_write(pin, GpioLevel::High)?;
    device.invalidate_cache();
    assert_eq!(device.gpio_read(pin)?, GpioLevel::High, "Pin should read HIGH");

    device.gpio_write(pin, GpioLevel::Low)?;
    device.invalidate_cache();
    assert_eq!(device.gpio_read(pin)?, GpioLevel::Low, "Pin should read LOW");

    // Cleanup: Set back to input
    device.gpio_set_direction(pin, GpioDirection::Input)?;
    Ok(())
}

#[test]
#[ignore] // Ignore by default, requires hardware
fn test_chip_status() -> Result<()> {
    let mut device = open_test_device();
    let status = device.chip_status()?;
    println!("Chip status: {:?}", status);
    println!("Boot chip settings: {:?}", device.boot_chip_settings()?);
    println!("SPI settings: {:?}", device.spi_settings()?);
    Ok(())
}
