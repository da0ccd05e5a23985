// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reads input registers from a real device on a serial line.

use std::time::Duration;

use modbus_rtu_master::{
    transport::{SerialConfig, SerialTransport, Transport},
    Client, Slave,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let port_name = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_owned());

    let config = SerialConfig::new(port_name)
        .baud_rate(19_200)
        .read_timeout(Duration::from_secs(1));
    let mut port = SerialTransport::new(config)?;
    port.open()?;

    let mut master = Client::new(&mut port);
    match master.read_input_registers(Slave(1), 0x0000, 4)? {
        Ok(data) => println!("input registers: {data:02X?}"),
        Err(exception) => println!("device refused the read: {exception}"),
    }

    port.close();
    Ok(())
}
