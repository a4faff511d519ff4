use std::io::{Read, Write};

pub fn read_i32(reader: &mut dyn Read) -> std::io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

pub fn read_f32(reader: &mut dyn Read) -> std::io::Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

pub fn write_f32(writer: &mut dyn Write, val: f32) -> std::io::Result<()> {
    writer.write_all(&val.to_le_bytes())
}
