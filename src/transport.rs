use std::io;
use std::net::UdpSocket;
use std::sync::{Arc, Mutex};

fn is_bad_descriptor(err: &io::Error) -> bool {
    match err.raw_os_error() {
        #[cfg(any(target_os = "linux", target_os = "android"))]
        Some(code) => code == libc::EBADF || code == libc::EBADFD,
        #[cfg(all(unix, not(any(target_os = "linux", target_os = "android"))))]
        Some(code) => code == libc::EBADF,
        _ => false,
    }
}

/// The write side of the device a GRO session emits packets to.
pub trait PacketWriter: Send + Sync {
    /// Write one complete packet.
    fn send(&self, buf: &[u8]) -> io::Result<usize>;

    /// Write `bufs[i][offset..]` for every buffer, returning how many packets
    /// were written.
    ///
    /// A failed packet does not stop the rest of the batch; the first error is
    /// reported once every packet has been attempted. A bad descriptor aborts
    /// immediately.
    fn send_multiple(&self, bufs: &[&[u8]], offset: usize) -> io::Result<usize> {
        let mut count = 0;
        let mut err = Ok(());
        for buf in bufs {
            let Some(packet) = buf.get(offset..) else {
                let e = io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("offset {offset} beyond buffer of {} bytes", buf.len()),
                );
                if err.is_ok() {
                    err = Err(e);
                }
                continue;
            };
            match self.send(packet) {
                Ok(_) => count += 1,
                Err(e) => {
                    if is_bad_descriptor(&e) {
                        return Err(e);
                    }
                    log::warn!("send of {} bytes failed: {e}", packet.len());
                    if err.is_ok() {
                        err = Err(e);
                    }
                }
            }
        }
        err?;
        Ok(count)
    }
}

/// A connected socket.
impl PacketWriter for UdpSocket {
    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        UdpSocket::send(self, buf)
    }
}

/// Any writer where one `write` call carries one packet, such as a Tun file
/// descriptor opened as a `File`. A short write leaves a truncated packet
/// behind and fails with [`io::ErrorKind::WriteZero`].
impl<W: io::Write + Send> PacketWriter for Mutex<W> {
    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        let mut writer = self
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "writer lock poisoned"))?;
        let n = writer.write(buf)?;
        if n != buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {n} of {} bytes", buf.len()),
            ));
        }
        Ok(n)
    }
}

impl<T: PacketWriter + ?Sized> PacketWriter for Arc<T> {
    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).send(buf)
    }
    fn send_multiple(&self, bufs: &[&[u8]], offset: usize) -> io::Result<usize> {
        (**self).send_multiple(bufs, offset)
    }
}

impl<T: PacketWriter + ?Sized> PacketWriter for Box<T> {
    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).send(buf)
    }
    fn send_multiple(&self, bufs: &[&[u8]], offset: usize) -> io::Result<usize> {
        (**self).send_multiple(bufs, offset)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct FailSecond(Mutex<Vec<Vec<u8>>>);

    impl PacketWriter for FailSecond {
        fn send(&self, buf: &[u8]) -> io::Result<usize> {
            let mut sent = self.0.lock().unwrap();
            sent.push(buf.to_vec());
            if sent.len() == 2 {
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "full"));
            }
            Ok(buf.len())
        }
    }

    #[test]
    fn mutex_writer() {
        let writer = Mutex::new(Vec::<u8>::new());
        let bufs: [&[u8]; 2] = [&[0, 0, 1, 2], &[0, 0, 3]];
        let n = writer.send_multiple(&bufs, 2).unwrap();
        assert_eq!(n, 2);
        assert_eq!(writer.into_inner().unwrap(), vec![1u8, 2, 3]);
    }

    #[test]
    fn keeps_going_after_error() {
        let writer = FailSecond(Mutex::new(Vec::new()));
        let bufs: [&[u8]; 3] = [&[1], &[2], &[3]];
        let err = writer.send_multiple(&bufs, 0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
        assert_eq!(writer.0.lock().unwrap().len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn bad_descriptor_aborts() {
        struct BadFd;
        impl PacketWriter for BadFd {
            fn send(&self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::from_raw_os_error(libc::EBADF))
            }
        }
        let bufs: [&[u8]; 2] = [&[1], &[2]];
        let err = BadFd.send_multiple(&bufs, 0).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }

    /// Accepts at most `limit` bytes per call.
    struct Narrow {
        limit: usize,
        written: Vec<u8>,
    }

    impl io::Write for Narrow {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(self.limit);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn short_write_not_counted() {
        let writer = Mutex::new(Narrow {
            limit: 4,
            written: Vec::new(),
        });
        let bufs: [&[u8]; 3] = [&[1, 2], &[3, 4, 5, 6, 7, 8], &[9]];
        let err = writer.send_multiple(&bufs, 0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        // the packets on either side still go out
        assert_eq!(writer.lock().unwrap().written, vec![1u8, 2, 3, 4, 5, 6, 9]);

        let whole: [&[u8]; 2] = [&[1, 2], &[9]];
        assert_eq!(writer.send_multiple(&whole, 0).unwrap(), 2);
    }

    #[test]
    fn offset_past_end() {
        let writer = Mutex::new(Vec::<u8>::new());
        let bufs: [&[u8]; 2] = [&[1], &[0, 0, 5]];
        let err = writer.send_multiple(&bufs, 2).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(writer.into_inner().unwrap(), vec![5u8]);
    }
}
