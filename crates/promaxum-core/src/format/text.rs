use bytes::{BufMut, BytesMut};
use prometheus::Encoder;
use prometheus::proto::MetricFamily;

use crate::error::EncodeResult;
use crate::format::{MetricEncoder, check_family};

/// Prometheus text format 0.0.4, delegated to `prometheus::TextEncoder`.
pub struct TextFormat<'a> {
    out: &'a mut BytesMut,
    encoder: prometheus::TextEncoder,
}

impl<'a> TextFormat<'a> {
    pub fn new(out: &'a mut BytesMut) -> Self {
        Self {
            out,
            encoder: prometheus::TextEncoder::new(),
        }
    }
}

impl MetricEncoder for TextFormat<'_> {
    fn encode(&mut self, family: &MetricFamily) -> EncodeResult<()> {
        check_family(family)?;
        let mut writer = (&mut *self.out).writer();
        self.encoder
            .encode(std::slice::from_ref(family), &mut writer)?;
        Ok(())
    }
}
