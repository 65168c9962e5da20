use hidapi::HidApi;
use mcp2210_hid::{Mcp2210, Result};

fn main() -> Result<()> {
    env_logger::init();
    let hid_api = HidApi::new()?;

    let devices = mcp2210_hid::device_find_all(&hid_api);
    if devices.is_empty() {
        eprintln!("No MCP2210 devices found.");
        return Ok(());
    }
    for (i, info) in devices.iter().enumerate() {
        println!(
            "[{}] {:04X}:{:04X} serial={:?} product={:?}",
            i, info.vid, info.pid, info.serial_number, info.product_string
        );
    }

    let mut device = Mcp2210::open(&hid_api, &devices[0])?;
    println!("\nManufacturer: {}", device.manufacturer_name()?);
    println!("Product:      {}", device.product_name()?);
    println!("Chip status:  {:?}", device.chip_status()?);
    println!("USB (boot):   {:?}", device.boot_usb_settings()?);
    println!("Chip (boot):  {:?}", device.boot_chip_settings()?);
    println!("SPI (boot):   {:?}", device.boot_spi_settings()?);
    println!("Chip:         {:?}", device.chip_settings()?);
    println!("SPI:          {:?}", device.spi_settings()?);
    println!("GPIO dir:     0x{:04X}", device.gpio_direction_raw()?);
    println!("GPIO value:   0x{:04X}", device.gpio_values_raw()?);

    println!("\nEEPROM:");
    let data = device.eeprom().read_range(..)?;
    for (row, bytes) in data.chunks(16).enumerate() {
        println!("{:02X}: {:02X?}", row * 16, bytes);
    }
    Ok(())
}
