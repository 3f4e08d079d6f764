// ethtool command buffers (linux/ethtool.h), host endian.
//
// ethtool_sset_info { u32 cmd; u32 reserved; u64 sset_mask; u32 data[]; }
// ethtool_gstrings  { u32 cmd; u32 string_set; u32 len; u8 data[]; }
// ethtool_stats     { u32 cmd; u32 n_stats; u64 data[]; }

pub const ETHTOOL_GSTRINGS: u32 = 0x0000_001b;
pub const ETHTOOL_GSTATS: u32 = 0x0000_001d;
pub const ETHTOOL_GSSET_INFO: u32 = 0x0000_0037;
pub const ETH_SS_STATS: u32 = 0x1;
pub const ETH_GSTRING_LEN: usize = 32;

/// Spare entries past the GSSET_INFO count in GSTRINGS/GSTATS buffers. The kernel
/// fills those commands from the driver's current count, not from the header, so
/// a set that grows between phases spills into this margin.
pub const ENTRY_HEADROOM: usize = 64;

const SSET_INFO_MASK_OFFSET: usize = 8;
const SSET_INFO_DATA_OFFSET: usize = 16;
const GSTRINGS_HEADER_LEN: usize = 12;
const GSTATS_HEADER_LEN: usize = 8;

fn put_u32(buf: &mut [u8], offset: usize, v: u32) {
    buf[offset..offset + 4].copy_from_slice(&v.to_ne_bytes());
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_ne_bytes(b)
}

fn read_u64(buf: &[u8], offset: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_ne_bytes(b)
}

/// GSSET_INFO request for a single string set, with room for one count.
pub fn sset_info_request(set_id: u32) -> Vec<u8> {
    let mut buf = vec![0u8; SSET_INFO_DATA_OFFSET + 4];
    put_u32(&mut buf, 0, ETHTOOL_GSSET_INFO);
    buf[SSET_INFO_MASK_OFFSET..SSET_INFO_DATA_OFFSET].copy_from_slice(&(1u64 << set_id).to_ne_bytes());
    buf
}

/// Entry count of the requested set; 0 when the kernel cleared the mask bit.
pub fn sset_info_count(buf: &[u8]) -> u32 {
    if read_u64(buf, SSET_INFO_MASK_OFFSET) == 0 {
        return 0;
    }
    read_u32(buf, SSET_INFO_DATA_OFFSET)
}

pub fn gstrings_request(string_set: u32, count: u32) -> Vec<u8> {
    let slots = count as usize + ENTRY_HEADROOM;
    let mut buf = vec![0u8; GSTRINGS_HEADER_LEN + slots * ETH_GSTRING_LEN];
    put_u32(&mut buf, 0, ETHTOOL_GSTRINGS);
    put_u32(&mut buf, 4, string_set);
    put_u32(&mut buf, 8, count);
    buf
}

/// `len` as written back by the kernel.
pub fn gstrings_len(buf: &[u8]) -> u32 {
    read_u32(buf, 8)
}

/// Names in table order; each slot is cut at its first NUL.
pub fn gstrings_names(buf: &[u8], count: u32) -> Vec<String> {
    buf[GSTRINGS_HEADER_LEN..]
        .chunks_exact(ETH_GSTRING_LEN)
        .take(count as usize)
        .map(decode_gstring)
        .collect()
}

pub fn decode_gstring(slot: &[u8]) -> String {
    let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    String::from_utf8_lossy(&slot[..end]).into_owned()
}

pub fn gstats_request(count: u32) -> Vec<u8> {
    let slots = count as usize + ENTRY_HEADROOM;
    let mut buf = vec![0u8; GSTATS_HEADER_LEN + slots * 8];
    put_u32(&mut buf, 0, ETHTOOL_GSTATS);
    put_u32(&mut buf, 4, count);
    buf
}

/// `n_stats` as written back by the kernel.
pub fn gstats_len(buf: &[u8]) -> u32 {
    read_u32(buf, 4)
}

pub fn gstats_values(buf: &[u8], count: u32) -> Vec<u64> {
    buf[GSTATS_HEADER_LEN..]
        .chunks_exact(8)
        .take(count as usize)
        .map(|c| read_u64(c, 0))
        .collect()
}
