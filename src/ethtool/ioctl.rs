// SIOCETHTOOL over an AF_INET datagram control socket.

use super::Transport;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

pub const SIOCETHTOOL: u32 = 0x8946;
pub const IFNAMSIZ: usize = 16;

/// struct ifreq with the ifr_data member of the union; padded to the kernel's 40 bytes.
#[repr(C)]
struct IfReq {
    ifr_name: [libc::c_char; IFNAMSIZ],
    ifr_data: *mut libc::c_void,
    _pad: [u8; 24 - std::mem::size_of::<usize>()],
}

/// Owns the control socket for the lifetime of the sampler; closed on drop.
pub struct IoctlTransport {
    sock: OwnedFd,
}

impl IoctlTransport {
    pub fn open() -> io::Result<Self> {
        // SAFETY: plain socket(2) call; the returned descriptor is checked before use.
        let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM | libc::SOCK_CLOEXEC, 0) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: fd is a freshly opened descriptor owned by nobody else.
        let sock = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(Self { sock })
    }
}

pub(super) fn ifr_name(interface: &str) -> Option<[libc::c_char; IFNAMSIZ]> {
    let bytes = interface.as_bytes();
    if bytes.is_empty() || bytes.len() >= IFNAMSIZ || bytes.contains(&0) {
        return None;
    }
    let mut name = [0 as libc::c_char; IFNAMSIZ];
    for (dst, src) in name.iter_mut().zip(bytes) {
        *dst = *src as libc::c_char;
    }
    Some(name)
}

impl Transport for IoctlTransport {
    fn exchange(&self, interface: &str, buf: &mut [u8]) -> io::Result<()> {
        let ifr_name = ifr_name(interface).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "invalid interface name")
        })?;
        let mut req = IfReq {
            ifr_name,
            ifr_data: buf.as_mut_ptr().cast(),
            _pad: [0; 24 - std::mem::size_of::<usize>()],
        };
        // SAFETY: req points at a live ifreq whose ifr_data references `buf`; both
        // outlive the call. GSTRINGS/GSTATS copy out the driver's count at call time,
        // ignoring the header, so `buf` is only safe while that count stays within the
        // wire::ENTRY_HEADROOM margin over the GSSET_INFO answer. Nothing here can
        // bound a larger jump; the Malformed check only sees it after the write.
        let rc = unsafe {
            libc::ioctl(
                self.sock.as_raw_fd(),
                SIOCETHTOOL as _,
                &mut req as *mut IfReq,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}
