//! Constant-time padded base64 over a configurable alphabet.
//!
//! Two alphabets are in use: [`STANDARD`] for the `sign` field inside the envelope, and
//! [`TOKEN`] for the token itself, which is standard base64 with the three characters that
//! are unsafe in URLs replaced according to [`SUBSTITUTIONS`].

// Code taken from base64ct.
// Licensed from the RustCrypto developers under Apache-2.0.
// <https://github.com/RustCrypto/formats/blob/master/base64ct/LICENSE-APACHE>
//
// Modified to support padding and a configurable choice of the last two symbols.

use core::fmt;

use crate::CodecError;

/// The symbols that distinguish one base64 alphabet from another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Alphabet {
    c62: u8,
    c63: u8,
    pad: u8,
}

/// RFC 4648 base64, `+` and `/` with `=` padding.
pub const STANDARD: Alphabet = Alphabet {
    c62: b'+',
    c63: b'/',
    pad: b'=',
};

/// Fixed character substitution that turns standard base64 into the token alphabet.
pub const SUBSTITUTIONS: [(u8, u8); 3] = [(b'+', b'*'), (b'/', b'-'), (b'=', b'_')];

/// The token alphabet, `[A-Za-z0-9*-]` with `_` padding.
pub const TOKEN: Alphabet = STANDARD.substitute(&SUBSTITUTIONS);

impl Alphabet {
    const fn substitute(self, table: &[(u8, u8)]) -> Self {
        let mut out = self;
        let mut i = 0;
        while i < table.len() {
            let (from, to) = table[i];
            if self.c62 == from {
                out.c62 = to;
            }
            if self.c63 == from {
                out.c63 = to;
            }
            if self.pad == from {
                out.pad = to;
            }
            i += 1;
        }
        out
    }

    /// Whether `byte` may appear in text encoded with this alphabet.
    pub fn contains(&self, byte: u8) -> bool {
        byte.is_ascii_alphanumeric() || byte == self.c62 || byte == self.c63 || byte == self.pad
    }
}

pub fn encode(alphabet: &Alphabet, bytes: &[u8]) -> Result<String, fmt::Error> {
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    write_to_fmt(alphabet, bytes, &mut out)?;
    Ok(out)
}

pub fn write_to_fmt(alphabet: &Alphabet, bytes: &[u8], f: &mut impl fmt::Write) -> fmt::Result {
    let mut tmp = [0; 4];

    let (chunks, rem) = bytes.as_chunks::<3>();
    for s in chunks {
        encode_3bytes(alphabet, s, &mut tmp);
        f.write_str(ascii(&tmp)?)?;
    }

    if rem.is_empty() {
        return Ok(());
    }

    let len = encode_last(alphabet, rem, &mut tmp).len();
    tmp[len..].fill(alphabet.pad);
    f.write_str(ascii(&tmp)?)
}

fn ascii(bytes: &[u8]) -> Result<&str, fmt::Error> {
    core::str::from_utf8(bytes).map_err(|_| fmt::Error)
}

fn encode_last<'a>(alphabet: &Alphabet, bytes: &[u8], dst: &'a mut [u8; 4]) -> &'a [u8] {
    let tmp;
    let len = match *bytes {
        [] => {
            tmp = [0; 3];
            0
        }
        [a] => {
            tmp = [a, 0, 0];
            2
        }
        [a, b] => {
            tmp = [a, b, 0];
            3
        }
        [a, b, c, ..] => {
            tmp = [a, b, c];
            4
        }
    };

    encode_3bytes(alphabet, &tmp, dst);
    &dst[..len]
}

/// Decode padded base64. The input length must be a multiple of four.
pub fn decode_vec(alphabet: &Alphabet, src: &[u8]) -> Result<Vec<u8>, CodecError> {
    if src.len() % 4 != 0 {
        return Err(CodecError::DecodeFailure);
    }

    let pad = alphabet.pad;
    let unpadded = match src {
        [rest @ .., a, b] if *a == pad && *b == pad => rest,
        [rest @ .., a] if *a == pad => rest,
        _ => src,
    };

    let mut dst = vec![0; decoded_len(unpadded.len())];
    decode_inner(alphabet, unpadded, &mut dst)?;
    Ok(dst)
}

fn decode_inner(alphabet: &Alphabet, src: &[u8], dst: &mut [u8]) -> Result<(), CodecError> {
    let (src_chunks, src_rem) = src.as_chunks::<4>();
    let (dst_chunks, dst_rem) = dst.as_chunks_mut::<3>();

    let mut err = 0;
    for (s, d) in core::iter::zip(src_chunks, dst_chunks) {
        err |= decode_3bytes(alphabet, s, d);
    }

    err |= !(src_rem.is_empty() || src_rem.len() >= 2) as i16;
    let mut tmp_out = [0u8; 3];
    let mut tmp_in = [b'A'; 4];
    tmp_in[..src_rem.len()].copy_from_slice(src_rem);
    err |= decode_3bytes(alphabet, &tmp_in, &mut tmp_out);
    dst_rem.copy_from_slice(&tmp_out[..dst_rem.len()]);

    if err == 0 {
        validate_last_block(alphabet, src, dst)
    } else {
        Err(CodecError::DecodeFailure)
    }
}

/// Validate that the last block of the decoded data round-trips back to the
/// encoded data, so that every byte string has exactly one encoding.
fn validate_last_block(
    alphabet: &Alphabet,
    encoded: &[u8],
    decoded: &[u8],
) -> Result<(), CodecError> {
    if encoded.is_empty() && decoded.is_empty() {
        return Ok(());
    }

    fn last_block_start(bytes: &[u8], block_size: usize) -> usize {
        (bytes.len().saturating_sub(1) / block_size) * block_size
    }

    let enc_block = encoded
        .get(last_block_start(encoded, 4)..)
        .ok_or(CodecError::DecodeFailure)?;

    let dec_block = decoded
        .get(last_block_start(decoded, 3)..)
        .ok_or(CodecError::DecodeFailure)?;

    let mut buf = [0u8; 4];
    let bytes = encode_last(alphabet, dec_block, &mut buf);

    // Non-short-circuiting comparison of the final block
    if bytes.len() == enc_block.len()
        && bytes
            .iter()
            .zip(enc_block.iter())
            .fold(0, |acc, (a, b)| acc | (a ^ b))
            == 0
    {
        Ok(())
    } else {
        Err(CodecError::DecodeFailure)
    }
}

/// Get the length of the output from decoding the provided *unpadded*
/// base64-encoded input.
#[inline(always)]
pub(crate) fn decoded_len(input_len: usize) -> usize {
    // overflow-proof computation of `(3*n)/4`
    let k = input_len / 4;
    let l = input_len - 4 * k;
    3 * k + (3 * l) / 4
}

#[inline(always)]
fn decode_3bytes(alphabet: &Alphabet, src: &[u8; 4], dst: &mut [u8; 3]) -> i16 {
    let c0 = decode_6bits(alphabet, src[0]);
    let c1 = decode_6bits(alphabet, src[1]);
    let c2 = decode_6bits(alphabet, src[2]);
    let c3 = decode_6bits(alphabet, src[3]);

    dst[0] = ((c0 << 2) | (c1 >> 4)) as u8;
    dst[1] = ((c1 << 4) | (c2 >> 2)) as u8;
    dst[2] = ((c2 << 6) | c3) as u8;

    ((c0 | c1 | c2 | c3) >> 8) & 1
}

/// Decode 6 bits of a base64 message. Returns -1 for bytes outside the alphabet.
fn decode_6bits(alphabet: &Alphabet, src: u8) -> i16 {
    let src = src as i16;
    let mut ret: i16 = -1;

    ret += ((((b'A' as i16 - 1) - src) & (src - (b'Z' as i16 + 1))) >> 8) & (src + -64);
    ret += ((((b'a' as i16 - 1) - src) & (src - (b'z' as i16 + 1))) >> 8) & (src + -70);
    ret += ((((b'0' as i16 - 1) - src) & (src - (b'9' as i16 + 1))) >> 8) & (src + 5);
    ret += match_symbol(alphabet.c62, src, 63);
    ret += match_symbol(alphabet.c63, src, 64);

    ret
}

/// `value` if `src == symbol`, otherwise 0.
#[inline(always)]
fn match_symbol(symbol: u8, src: i16, value: i16) -> i16 {
    let symbol = symbol as i16;
    (((symbol - 1 - src) & (src - (symbol + 1))) >> 8) & value
}

#[inline(always)]
fn encode_3bytes(alphabet: &Alphabet, src: &[u8; 3], dst: &mut [u8; 4]) {
    let b0 = src[0] as i16;
    let b1 = src[1] as i16;
    let b2 = src[2] as i16;

    dst[0] = encode_6bits(alphabet, b0 >> 2);
    dst[1] = encode_6bits(alphabet, ((b0 << 4) | (b1 >> 4)) & 63);
    dst[2] = encode_6bits(alphabet, ((b1 << 2) | (b2 >> 6)) & 63);
    dst[3] = encode_6bits(alphabet, b2 & 63);
}

#[inline(always)]
fn encode_6bits(alphabet: &Alphabet, src: i16) -> u8 {
    let c62 = alphabet.c62 as i16;
    let c63 = alphabet.c63 as i16;
    let mut diff = src + b'A' as i16;

    diff += ((25 - src) >> 8) & 6;
    diff += ((51 - src) >> 8) & -75;
    diff += ((61 - src) >> 8) & (c62 - (b'0' as i16 + 10));
    diff += ((62 - src) >> 8) & (c63 - c62 - 1);

    diff as u8
}
