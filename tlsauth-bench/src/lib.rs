//! Shared inputs for the token benchmarks.

/// Payload sizes benchmarked, in bytes.
pub const PAYLOAD_SIZES: [usize; 3] = [16, 1024, 64 * 1024];

/// A printable payload of `len` bytes that compresses about as well as typical session data.
pub fn sample_payload(len: usize) -> String {
    const WORDS: [&str; 8] = [
        "user=", "42;", "role=admin;", "scope=", "read,", "write;", "tenant=", "acme;",
    ];
    let mut out = String::with_capacity(len + 16);
    let mut i = 0usize;
    while out.len() < len {
        out.push_str(WORDS[i % WORDS.len()]);
        // vary the stream so it is not a single repeated run
        out.push(char::from(b'a' + (i.wrapping_mul(7) % 26) as u8));
        i += 1;
    }
    out.truncate(len);
    out
}
