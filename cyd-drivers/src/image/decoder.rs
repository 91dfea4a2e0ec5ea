//! Baseline JPEG decoder with MCU-row output
//!
//! The entropy-coded data is decoded one row of MCUs at a time into a strip
//! of RGB565 pixels at most 32 lines tall (16 for the usual 4:2:0 files). A
//! full 320x240 frame therefore needs one 10 KiB strip of working memory
//! instead of a decoded frame, which does not fit the ESP32 heap.
//!
//! Supported: Huffman-coded baseline and extended sequential frames with
//! 8-bit samples, one (grayscale) or three (YCbCr) components in a single
//! interleaved scan, any sampling factors up to 4, restart intervals.
//! Progressive, lossless, arithmetic-coded, 12-bit and multi-scan sequential
//! files are rejected as [`JpegError::Unsupported`]. Chroma is upsampled by
//! pixel replication.

use alloc::vec;
use alloc::vec::Vec;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use super::jpeg::rgb888_to_rgb565;

/// Decoder errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JpegError {
    /// Markers, tables or entropy-coded data are malformed
    Format,
    /// Well-formed file using a coding process this decoder does not handle
    Unsupported,
}

/// One band of decoded image rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strip<'a> {
    /// First image row covered
    pub y: u16,
    /// Image width in pixels
    pub width: u16,
    /// Number of rows
    pub rows: u16,
    /// `width * rows` pixels, row-major
    pub pixels: &'a [Rgb565],
}

/// Natural-order position of each zigzag coefficient
const ZIGZAG: [u8; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27,
    20, 13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58,
    59, 52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// `1024 * C(u) / 2 * cos((2x + 1) * u * pi / 16)`, row `x`, column `u`
const IDCT_BASIS: [i32; 64] = [
    362, 502, 473, 426, 362, 284, 196, 100, //
    362, 426, 196, -100, -362, -502, -473, -284, //
    362, 284, -196, -502, -362, 100, 473, 426, //
    362, 100, -473, -284, 362, 426, -196, -502, //
    362, -100, -473, 284, 362, -426, -196, 502, //
    362, -284, -196, 502, -362, -100, 473, -426, //
    362, -426, 196, 100, -362, 502, -473, 284, //
    362, -502, 473, -426, 362, -284, 196, -100,
];

/// Dequantized coefficients are clamped so the fixed-point IDCT stays in i32
const COEF_LIMIT: i32 = 8192;

const SOF0: u8 = 0xC0;
const SOF1: u8 = 0xC1;
const DHT: u8 = 0xC4;
const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const DQT: u8 = 0xDB;
const DRI: u8 = 0xDD;
const TEM: u8 = 0x01;

fn be16(data: &[u8], at: usize) -> Result<u16, JpegError> {
    data.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or(JpegError::Format)
}

/// Canonical Huffman table, decoded code length by code length
struct Huffman {
    max_code: [i32; 17],
    first_value: [i32; 17],
    min_code: [i32; 17],
    values: Vec<u8>,
}

impl Huffman {
    fn build(counts: &[u8], values: &[u8]) -> Result<Self, JpegError> {
        let mut table = Huffman {
            max_code: [-1; 17],
            first_value: [0; 17],
            min_code: [0; 17],
            values: values.to_vec(),
        };

        let mut code = 0i32;
        let mut k = 0i32;
        for (len, &count) in (1..=16).zip(counts) {
            let count = count as i32;
            if count > 0 {
                table.first_value[len] = k;
                table.min_code[len] = code;
                code += count;
                k += count;
                table.max_code[len] = code - 1;
            }
            // More codes than this length can hold
            if code > 1 << len {
                return Err(JpegError::Format);
            }
            code <<= 1;
        }

        Ok(table)
    }

    fn decode(&self, bits: &mut BitReader<'_>) -> Result<u8, JpegError> {
        let mut code = 0i32;
        for len in 1..=16 {
            code = (code << 1) | bits.take(1) as i32;
            if code <= self.max_code[len] {
                let at = self.first_value[len] + code - self.min_code[len];
                return self.values.get(at as usize).copied().ok_or(JpegError::Format);
            }
        }
        Err(JpegError::Format)
    }
}

/// MSB-first reader over entropy-coded data
///
/// Stuffed `FF 00` pairs read as `FF`. Once a marker (or the end of the
/// buffer) is reached only zero bits are returned.
struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    acc: u32,
    count: u32,
    at_marker: bool,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos,
            acc: 0,
            count: 0,
            at_marker: false,
        }
    }

    fn next_byte(&mut self) -> u8 {
        if self.at_marker {
            return 0;
        }
        let Some(&byte) = self.data.get(self.pos) else {
            self.at_marker = true;
            return 0;
        };
        if byte != 0xFF {
            self.pos += 1;
            return byte;
        }
        match self.data.get(self.pos + 1) {
            Some(0x00) => {
                self.pos += 2;
                0xFF
            }
            _ => {
                self.at_marker = true;
                0
            }
        }
    }

    fn fill(&mut self) {
        while self.count <= 24 {
            let byte = self.next_byte() as u32;
            self.acc |= byte << (24 - self.count);
            self.count += 8;
        }
    }

    /// Take `n` bits (at most 16)
    fn take(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        if self.count < n {
            self.fill();
        }
        let value = self.acc >> (32 - n);
        self.acc <<= n;
        self.count -= n;
        value
    }

    /// Drop buffered bits and skip past the next RSTn marker
    fn restart(&mut self) {
        self.acc = 0;
        self.count = 0;
        self.at_marker = false;

        while let Some(pair) = self.data.get(self.pos..self.pos + 2) {
            self.pos += 1;
            if pair[0] == 0xFF && (0xD0..=0xD7).contains(&pair[1]) {
                self.pos += 1;
                return;
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Component {
    id: u8,
    h: usize,
    v: usize,
    quant_table: usize,
    dc_table: usize,
    ac_table: usize,
}

/// Tables and prediction state for one scan component
struct Unit<'t> {
    component: usize,
    quant: &'t [u16; 64],
    dc: &'t Huffman,
    ac: &'t Huffman,
    pred: i32,
}

impl Unit<'_> {
    fn decode_block(
        &mut self,
        bits: &mut BitReader<'_>,
        coef: &mut [i32; 64],
    ) -> Result<(), JpegError> {
        coef.fill(0);

        let size = self.dc.decode(bits)? as u32;
        if size > 11 {
            return Err(JpegError::Format);
        }
        self.pred += extend(bits.take(size), size);
        coef[0] = dequantize(self.pred, self.quant[0]);

        let mut k = 1;
        while k < 64 {
            let symbol = self.ac.decode(bits)?;
            let run = (symbol >> 4) as usize;
            let size = (symbol & 0x0F) as u32;

            if size == 0 {
                if run == 15 {
                    k += 16;
                    continue;
                }
                // End of block
                break;
            }

            k += run;
            if k > 63 {
                return Err(JpegError::Format);
            }
            coef[ZIGZAG[k] as usize] = dequantize(extend(bits.take(size), size), self.quant[k]);
            k += 1;
        }

        Ok(())
    }
}

fn extend(value: u32, size: u32) -> i32 {
    if size == 0 {
        return 0;
    }
    let value = value as i32;
    if value < 1 << (size - 1) {
        value - (1 << size) + 1
    } else {
        value
    }
}

fn dequantize(value: i32, quant: u16) -> i32 {
    value
        .saturating_mul(quant as i32)
        .clamp(-COEF_LIMIT, COEF_LIMIT - 1)
}

/// Separable fixed-point inverse DCT with level shift
fn idct(coef: &[i32; 64], out: &mut [u8; 64]) {
    let mut tmp = [0i32; 64];

    for (v, row) in coef.chunks_exact(8).enumerate() {
        for x in 0..8 {
            let basis = &IDCT_BASIS[x * 8..x * 8 + 8];
            let sum: i32 = basis.iter().zip(row).map(|(b, c)| b * c).sum();
            tmp[v * 8 + x] = (sum + (1 << 6)) >> 7;
        }
    }

    for y in 0..8 {
        let basis = &IDCT_BASIS[y * 8..y * 8 + 8];
        for x in 0..8 {
            let sum: i32 = (0..8).map(|v| basis[v] * tmp[v * 8 + x]).sum();
            out[y * 8 + x] = (((sum + (1 << 12)) >> 13) + 128).clamp(0, 255) as u8;
        }
    }
}

fn clamp_u8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// JFIF YCbCr to RGB565
fn ycbcr_to_rgb565(y: u8, cb: u8, cr: u8) -> Rgb565 {
    let y = y as i32;
    let cb = cb as i32 - 128;
    let cr = cr as i32 - 128;

    let r = y + ((91_881 * cr + 32_768) >> 16);
    let g = y - ((22_554 * cb + 46_802 * cr + 32_768) >> 16);
    let b = y + ((116_130 * cb + 32_768) >> 16);

    rgb888_to_rgb565(clamp_u8(r), clamp_u8(g), clamp_u8(b))
}

/// Parsed JPEG headers, ready to decode the scan that follows them
pub struct JpegDecoder<'a> {
    data: &'a [u8],
    width: u16,
    height: u16,
    components: Vec<Component>,
    scan: Vec<usize>,
    quant: [[u16; 64]; 4],
    dc: [Option<Huffman>; 4],
    ac: [Option<Huffman>; 4],
    restart_interval: u16,
    scan_start: usize,
}

impl<'a> JpegDecoder<'a> {
    /// Read every marker segment up to the start of the first scan
    pub fn parse(data: &'a [u8]) -> Result<Self, JpegError> {
        if data.get(..2) != Some(&[0xFF, SOI][..]) {
            return Err(JpegError::Format);
        }

        let mut jpeg = Self {
            data,
            width: 0,
            height: 0,
            components: Vec::new(),
            scan: Vec::new(),
            quant: [[0; 64]; 4],
            dc: [None, None, None, None],
            ac: [None, None, None, None],
            restart_interval: 0,
            scan_start: 0,
        };

        let mut pos = 2;
        loop {
            let marker = next_marker(data, &mut pos)?;
            match marker {
                SOI | TEM | 0xD0..=0xD7 => continue,
                EOI => return Err(JpegError::Format),
                _ => {}
            }

            let len = be16(data, pos)? as usize;
            if len < 2 {
                return Err(JpegError::Format);
            }
            let segment = data.get(pos + 2..pos + len).ok_or(JpegError::Format)?;
            pos += len;

            match marker {
                SOF0 | SOF1 => jpeg.read_frame(segment)?,
                0xC2 | 0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => {
                    return Err(JpegError::Unsupported)
                }
                DHT => jpeg.read_huffman(segment)?,
                DQT => jpeg.read_quant(segment)?,
                DRI => jpeg.restart_interval = be16(segment, 0)?,
                SOS => {
                    jpeg.read_scan(segment)?;
                    jpeg.scan_start = pos;
                    return Ok(jpeg);
                }
                // APPn, COM and the rest carry nothing needed for pixels
                _ => {}
            }
        }
    }

    /// Image width in pixels
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Image size
    pub fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }

    /// Height of the strips handed to the sink (the last one may be shorter)
    pub fn strip_rows(&self) -> u16 {
        8 * self.components.iter().map(|c| c.v).max().unwrap_or(1) as u16
    }

    fn read_frame(&mut self, segment: &[u8]) -> Result<(), JpegError> {
        let header = segment.get(..6).ok_or(JpegError::Format)?;
        if header[0] != 8 {
            return Err(JpegError::Unsupported);
        }
        self.height = u16::from_be_bytes([header[1], header[2]]);
        self.width = u16::from_be_bytes([header[3], header[4]]);

        let count = header[5] as usize;
        // Height 0 defers to a DNL marker after the scan
        if !matches!(count, 1 | 3) || self.width == 0 || self.height == 0 {
            return Err(JpegError::Unsupported);
        }

        let specs = segment.get(6..6 + 3 * count).ok_or(JpegError::Format)?;
        self.components = specs
            .chunks_exact(3)
            .map(|spec| {
                let (h, v) = ((spec[1] >> 4) as usize, (spec[1] & 0x0F) as usize);
                if !(1..=4).contains(&h) || !(1..=4).contains(&v) || spec[2] > 3 {
                    return Err(JpegError::Format);
                }
                Ok(Component {
                    id: spec[0],
                    h,
                    v,
                    quant_table: spec[2] as usize,
                    dc_table: 0,
                    ac_table: 0,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // A single-component scan is not interleaved: one block per MCU
        if let [only] = self.components.as_mut_slice() {
            only.h = 1;
            only.v = 1;
        }

        Ok(())
    }

    fn read_huffman(&mut self, segment: &[u8]) -> Result<(), JpegError> {
        let mut rest = segment;
        while let Some((&class_id, tail)) = rest.split_first() {
            let (class, id) = (class_id >> 4, (class_id & 0x0F) as usize);
            if class > 1 || id > 3 {
                return Err(JpegError::Format);
            }

            let counts = tail.get(..16).ok_or(JpegError::Format)?;
            let total: usize = counts.iter().map(|&c| c as usize).sum();
            if total > 256 {
                return Err(JpegError::Format);
            }
            let values = tail.get(16..16 + total).ok_or(JpegError::Format)?;

            let table = Some(Huffman::build(counts, values)?);
            if class == 0 {
                self.dc[id] = table;
            } else {
                self.ac[id] = table;
            }
            rest = &tail[16 + total..];
        }
        Ok(())
    }

    fn read_quant(&mut self, segment: &[u8]) -> Result<(), JpegError> {
        let mut rest = segment;
        while let Some((&precision_id, tail)) = rest.split_first() {
            let id = (precision_id & 0x0F) as usize;
            if id > 3 {
                return Err(JpegError::Format);
            }

            let table = &mut self.quant[id];
            if precision_id >> 4 == 0 {
                let values = tail.get(..64).ok_or(JpegError::Format)?;
                for (q, &value) in table.iter_mut().zip(values) {
                    *q = value as u16;
                }
                rest = &tail[64..];
            } else {
                let values = tail.get(..128).ok_or(JpegError::Format)?;
                for (q, pair) in table.iter_mut().zip(values.chunks_exact(2)) {
                    *q = u16::from_be_bytes([pair[0], pair[1]]);
                }
                rest = &tail[128..];
            }
        }
        Ok(())
    }

    fn read_scan(&mut self, segment: &[u8]) -> Result<(), JpegError> {
        if self.components.is_empty() {
            return Err(JpegError::Format);
        }

        let count = *segment.first().ok_or(JpegError::Format)? as usize;
        if count != self.components.len() {
            return Err(JpegError::Unsupported);
        }

        let specs = segment.get(1..1 + 2 * count).ok_or(JpegError::Format)?;
        self.scan.clear();
        for spec in specs.chunks_exact(2) {
            let index = self
                .components
                .iter()
                .position(|c| c.id == spec[0])
                .ok_or(JpegError::Format)?;
            if self.scan.contains(&index) {
                return Err(JpegError::Format);
            }

            let component = &mut self.components[index];
            component.dc_table = (spec[1] >> 4) as usize;
            component.ac_table = (spec[1] & 0x0F) as usize;
            if component.dc_table > 3 || component.ac_table > 3 {
                return Err(JpegError::Format);
            }
            self.scan.push(index);
        }
        Ok(())
    }

    /// Decode the scan, handing each MCU row to `sink` as it completes
    ///
    /// Stops at the first error from the decoder or the sink.
    pub fn decode<E, F>(&self, mut sink: F) -> Result<(), E>
    where
        E: From<JpegError>,
        F: FnMut(Strip<'_>) -> Result<(), E>,
    {
        let mut units = Vec::with_capacity(self.scan.len());
        for &index in &self.scan {
            let component = &self.components[index];
            units.push(Unit {
                component: index,
                quant: &self.quant[component.quant_table],
                dc: self.dc[component.dc_table].as_ref().ok_or(JpegError::Format)?,
                ac: self.ac[component.ac_table].as_ref().ok_or(JpegError::Format)?,
                pred: 0,
            });
        }

        let h_max = self.components.iter().map(|c| c.h).max().unwrap_or(1);
        let v_max = self.components.iter().map(|c| c.v).max().unwrap_or(1);
        let (mcu_width, mcu_height) = (8 * h_max, 8 * v_max);

        let width = self.width as usize;
        let height = self.height as usize;
        let mcus_across = width.div_ceil(mcu_width);
        let mcus_down = height.div_ceil(mcu_height);

        let mut planes: Vec<Vec<u8>> = self
            .components
            .iter()
            .map(|c| vec![0; c.h * c.v * 64])
            .collect();
        let mut strip = vec![Rgb565::BLACK; width * mcu_height];

        let mut bits = BitReader::new(self.data, self.scan_start);
        let mut coef = [0i32; 64];
        let mut block = [0u8; 64];
        let restart_interval = self.restart_interval as usize;
        let mut mcu = 0usize;

        for mcu_y in 0..mcus_down {
            let y0 = mcu_y * mcu_height;
            let rows = mcu_height.min(height - y0);

            for mcu_x in 0..mcus_across {
                if restart_interval > 0 && mcu > 0 && mcu % restart_interval == 0 {
                    bits.restart();
                    for unit in &mut units {
                        unit.pred = 0;
                    }
                }
                mcu += 1;

                for unit in &mut units {
                    let component = &self.components[unit.component];
                    let plane = &mut planes[unit.component];
                    let stride = component.h * 8;

                    for by in 0..component.v {
                        for bx in 0..component.h {
                            unit.decode_block(&mut bits, &mut coef)?;
                            idct(&coef, &mut block);
                            for (row, line) in block.chunks_exact(8).enumerate() {
                                let at = (by * 8 + row) * stride + bx * 8;
                                plane[at..at + 8].copy_from_slice(line);
                            }
                        }
                    }
                }

                let x0 = mcu_x * mcu_width;
                let cols = mcu_width.min(width - x0);
                for py in 0..rows {
                    for px in 0..cols {
                        let sample = |i: usize| {
                            let c = &self.components[i];
                            planes[i][(py * c.v / v_max) * c.h * 8 + px * c.h / h_max]
                        };
                        let pixel = if planes.len() == 1 {
                            let luma = sample(0);
                            rgb888_to_rgb565(luma, luma, luma)
                        } else {
                            ycbcr_to_rgb565(sample(0), sample(1), sample(2))
                        };
                        strip[py * width + x0 + px] = pixel;
                    }
                }
            }

            sink(Strip {
                y: y0 as u16,
                width: self.width,
                rows: rows as u16,
                pixels: &strip[..rows * width],
            })?;
        }

        Ok(())
    }
}

/// Skip to the byte after the next marker code
fn next_marker(data: &[u8], pos: &mut usize) -> Result<u8, JpegError> {
    if data.get(*pos) != Some(&0xFF) {
        return Err(JpegError::Format);
    }
    // Any number of fill bytes may precede the code
    while data.get(*pos) == Some(&0xFF) {
        *pos += 1;
    }
    let marker = *data.get(*pos).ok_or(JpegError::Format)?;
    *pos += 1;
    Ok(marker)
}
