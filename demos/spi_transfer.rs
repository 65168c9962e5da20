use hidapi::HidApi;
use mcp2210_hid::{Mcp2210, Result, SpiMode};

// Bit rate for the demo transfer
const BIT_RATE: u32 = 1_000_000;

fn main() -> Result<()> {
    env_logger::init();
    let hid_api = HidApi::new()?;
    println!("Opening first MCP2210 device...");
    let mut device = Mcp2210::open_first(&hid_api)?;
    println!("Device opened: {}", device.product_name()?);

    let mut settings = device.spi_settings()?;
    settings.bit_rate = BIT_RATE;
    settings.mode = SpiMode::Mode0;
    // Chip select on GP0, active low.
    settings.idle_cs = 0x01FF;
    settings.active_cs = 0x01FE;
    device.set_spi_settings(settings)?;
    println!("SPI settings: {:?}", settings);

    let tx = b"HELLO WORLD";
    let rx = device.spi_transfer(tx)?;
    println!("Sent:     {:02X?}", tx);
    println!("Received: {:02X?}", rx);
    if rx == tx {
        println!("Loopback OK (MOSI wired to MISO).");
    }

    // A longer transfer spans several reports.
    let long: Vec<u8> = (0..=255u8).collect();
    let rx = device.spi_transfer(&long)?;
    println!("Transferred {} bytes, got {} back.", long.len(), rx.len());
    Ok(())
}
