//! Two managers wired back to back through in-memory buffers.
//!
//! Run with:
//!   cargo run --example loopback

use std::sync::{Arc, Mutex};

use lanpacket::{PacketManager, SubPacket, NOP};

const FRAME_SENSOR: u8 = 0x10;
const UP_TEMPERATURE: u8 = 0x01;
const UP_LABEL: u8 = 0x02;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = PacketManager::new(Vec::new());
    let mut device = PacketManager::new(Vec::new());

    let readings = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&readings);
    device.add_handler(
        FRAME_SENSOR,
        UP_TEMPERATURE,
        move |up: &mut SubPacket<'_>| {
            let channel = up.read_byte();
            let celsius = up.read_float();
            if let Ok(mut readings) = sink.lock() {
                readings.push((channel, celsius));
            }
        },
    );
    device.add_handler(FRAME_SENSOR, UP_LABEL, |up: &mut SubPacket<'_>| {
        eprintln!("label: {}", up.read_str_field(16));
    });

    {
        let mut out = controller.create_with_request(FRAME_SENSOR, 1);
        out.open_session();
        for (channel, celsius) in [(0u8, 21.5f32), (1, 19.25)] {
            let mut up = out.up(UP_TEMPERATURE);
            up.write_byte(channel)?;
            up.write_float(celsius)?;
            up.store()?;
        }
        let mut up = out.up(UP_LABEL);
        up.write_str_field("boiler room", 16)?;
        up.store()?;
        out.close_session();
        out.send(true)?;
    }

    // Keep-alive: the device answers with a NOP of its own.
    controller.create_with_request(NOP, 2).send(false)?;
    // No table for this type on the device, so it is dropped.
    controller.create_with_request(0x42, 3).send(false)?;

    let wire = std::mem::take(controller.sink_mut());
    eprintln!("controller sent {} bytes", wire.len());
    for chunk in wire.chunks(7) {
        device.receive(chunk);
    }

    if let Ok(readings) = readings.lock() {
        for (channel, celsius) in readings.iter() {
            eprintln!("channel {channel}: {celsius:.2} C");
        }
    }

    let reply = std::mem::take(device.sink_mut());
    controller.receive(&reply);

    eprintln!("device stats: {:?}", device.stats());
    eprintln!("controller stats: {:?}", controller.stats());
    Ok(())
}
