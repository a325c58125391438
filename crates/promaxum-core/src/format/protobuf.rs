use bytes::{BufMut, BytesMut};
use prometheus::Encoder;
use prometheus::proto::MetricFamily;

use crate::error::EncodeResult;
use crate::format::{MetricEncoder, check_family};

/// Length-delimited protobuf, delegated to `prometheus::ProtobufEncoder`.
pub struct ProtobufFormat<'a> {
    out: &'a mut BytesMut,
    encoder: prometheus::ProtobufEncoder,
}

impl<'a> ProtobufFormat<'a> {
    pub fn new(out: &'a mut BytesMut) -> Self {
        Self {
            out,
            encoder: prometheus::ProtobufEncoder::new(),
        }
    }
}

impl MetricEncoder for ProtobufFormat<'_> {
    fn encode(&mut self, family: &MetricFamily) -> EncodeResult<()> {
        check_family(family)?;
        let mut writer = (&mut *self.out).writer();
        self.encoder
            .encode(std::slice::from_ref(family), &mut writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{IntGauge, Registry};

    #[test]
    fn test_encode_writes_length_prefixed_message() {
        let registry = Registry::new();
        let gauge = IntGauge::new("queue_depth", "Queue depth").unwrap();
        registry.register(Box::new(gauge.clone())).unwrap();
        gauge.set(7);

        let mut out = BytesMut::new();
        let mut encoder = ProtobufFormat::new(&mut out);
        for family in registry.gather() {
            encoder.encode(&family).unwrap();
        }

        // First byte is the varint length of the single message.
        assert!(!out.is_empty());
        assert_eq!(out[0] as usize, out.len() - 1);
    }
}
