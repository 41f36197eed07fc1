#[cfg(feature = "rtrb")]
use rtrb::Producer;

/// Where the tick handler puts one sample per tick.
///
/// There is no failure path: the converter is assumed ready at tick rate.
pub trait DacSink {
    fn write(&mut self, sample: i16);
}

/// Capture sink for tests and offline rendering.
impl DacSink for Vec<i16> {
    fn write(&mut self, sample: i16) {
        self.push(sample);
    }
}

/// Hands samples to another thread; a full ring drops the sample.
#[cfg(feature = "rtrb")]
impl DacSink for Producer<i16> {
    fn write(&mut self, sample: i16) {
        let _ = self.push(sample);
    }
}

impl<T: DacSink + ?Sized> DacSink for &mut T {
    fn write(&mut self, sample: i16) {
        (**self).write(sample);
    }
}
