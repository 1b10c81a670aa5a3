/// `f32` buffer whose last element sits right before an inaccessible page, so
/// a write or read past the end faults instead of silently succeeding.
///
/// Only unix targets get the guard page; elsewhere it is a plain `Vec`.
pub struct GuardedBuffer {
    #[cfg(unix)]
    ptr: *mut f32,
    #[cfg(unix)]
    map: *mut libc::c_void,
    #[cfg(unix)]
    map_len: usize,
    #[cfg(not(unix))]
    data: Vec<f32>,
    len: usize,
}

impl GuardedBuffer {
    #[cfg(unix)]
    pub fn new(len: usize) -> std::io::Result<Self> {
        let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        let page = if page > 0 { page as usize } else { 4096 };
        let bytes = len * core::mem::size_of::<f32>();
        let data_len = bytes.div_ceil(page) * page;
        let map_len = data_len + page;
        unsafe {
            let map = libc::mmap(
                core::ptr::null_mut(),
                map_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            );
            if map == libc::MAP_FAILED {
                return Err(std::io::Error::last_os_error());
            }
            let guard = (map as *mut u8).add(data_len);
            if libc::mprotect(guard as *mut libc::c_void, page, libc::PROT_NONE) != 0 {
                let err = std::io::Error::last_os_error();
                libc::munmap(map, map_len);
                return Err(err);
            }
            let ptr = guard.sub(bytes) as *mut f32;
            Ok(Self { ptr, map, map_len, len })
        }
    }

    #[cfg(not(unix))]
    pub fn new(len: usize) -> std::io::Result<Self> {
        Ok(Self { data: vec![0.0; len], len })
    }

    pub fn from_slice(src: &[f32]) -> std::io::Result<Self> {
        let mut buf = Self::new(src.len())?;
        buf.as_mut_slice().copy_from_slice(src);
        Ok(buf)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[cfg(unix)]
    pub fn as_slice(&self) -> &[f32] {
        unsafe { core::slice::from_raw_parts(self.ptr, self.len) }
    }

    #[cfg(unix)]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        unsafe { core::slice::from_raw_parts_mut(self.ptr, self.len) }
    }

    #[cfg(not(unix))]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[cfg(not(unix))]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

#[cfg(unix)]
impl Drop for GuardedBuffer {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.map, self.map_len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ends_at_guard() {
        let src: Vec<f32> = (0..37).map(|x| x as f32).collect();
        let mut buf = GuardedBuffer::from_slice(&src).unwrap();
        assert_eq!(buf.len(), 37);
        assert_eq!(buf.as_slice(), &src[..]);
        buf.as_mut_slice()[36] = -1.0;
        assert_eq!(buf.as_slice()[36], -1.0);
        assert!(GuardedBuffer::new(0).unwrap().is_empty());
    }
}
