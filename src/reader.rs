use crate::config::RegisterKind;
use crate::master::{Master, MasterError};
use crate::types::ProbeOutcome;

/// Dispatch a register kind to the matching read operation and
/// normalize the response into 16-bit values.
///
/// Bit reads (coils, discrete inputs) map `true`/`false` to `1`/`0`;
/// word reads pass through unchanged. Protocol failures propagate from
/// the master as-is.
pub async fn read_registers(
    master: &mut dyn Master,
    kind: RegisterKind,
    unit: u8,
    offset: u16,
    count: u16,
) -> Result<Vec<u16>, MasterError> {
    match kind {
        RegisterKind::Holding => master.read_holding(unit, offset, count).await,
        RegisterKind::Input => master.read_input(unit, offset, count).await,
        RegisterKind::Coil => Ok(to_words(master.read_coils(unit, offset, count).await?)),
        RegisterKind::DiscreteInput => {
            Ok(to_words(master.read_discrete(unit, offset, count).await?))
        }
    }
}

/// One read attempt against one candidate, folded into a tagged outcome.
pub async fn probe(
    master: &mut dyn Master,
    kind: RegisterKind,
    unit: u8,
    offset: u16,
    count: u16,
) -> ProbeOutcome {
    match read_registers(master, kind, unit, offset, count).await {
        Ok(values) => ProbeOutcome::Values(values),
        Err(err) => ProbeOutcome::from(err),
    }
}

fn to_words(bits: Vec<bool>) -> Vec<u16> {
    bits.into_iter().map(u16::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Master whose four operations return fixed payloads and record
    /// which operation was dispatched.
    struct FixedMaster {
        last_op: Option<&'static str>,
    }

    #[async_trait]
    impl Master for FixedMaster {
        async fn read_holding(
            &mut self,
            _unit: u8,
            _offset: u16,
            _count: u16,
        ) -> Result<Vec<u16>, MasterError> {
            self.last_op = Some("holding");
            Ok(vec![300, 0])
        }

        async fn read_input(
            &mut self,
            _unit: u8,
            _offset: u16,
            _count: u16,
        ) -> Result<Vec<u16>, MasterError> {
            self.last_op = Some("input");
            Ok(vec![7])
        }

        async fn read_coils(
            &mut self,
            _unit: u8,
            _offset: u16,
            _count: u16,
        ) -> Result<Vec<bool>, MasterError> {
            self.last_op = Some("coils");
            Ok(vec![true, false, true])
        }

        async fn read_discrete(
            &mut self,
            _unit: u8,
            _offset: u16,
            _count: u16,
        ) -> Result<Vec<bool>, MasterError> {
            self.last_op = Some("discrete");
            Err(MasterError::Timeout)
        }
    }

    #[tokio::test]
    async fn word_reads_pass_through_unchanged() {
        let mut master = FixedMaster { last_op: None };
        let values = read_registers(&mut master, RegisterKind::Holding, 1, 0, 1)
            .await
            .unwrap();
        assert_eq!(values, vec![300, 0]);
        assert_eq!(master.last_op, Some("holding"));
    }

    #[tokio::test]
    async fn bit_reads_normalize_to_ones_and_zeroes() {
        let mut master = FixedMaster { last_op: None };
        let values = read_registers(&mut master, RegisterKind::Coil, 1, 0, 3)
            .await
            .unwrap();
        assert_eq!(values, vec![1, 0, 1]);
        assert_eq!(master.last_op, Some("coils"));
    }

    #[tokio::test]
    async fn input_kind_dispatches_to_input_operation() {
        let mut master = FixedMaster { last_op: None };
        let values = read_registers(&mut master, RegisterKind::Input, 1, 0, 1)
            .await
            .unwrap();
        assert_eq!(values, vec![7]);
        assert_eq!(master.last_op, Some("input"));
    }

    #[tokio::test]
    async fn probe_tags_timeouts_distinctly() {
        let mut master = FixedMaster { last_op: None };
        let outcome = probe(&mut master, RegisterKind::DiscreteInput, 1, 0, 1).await;
        assert!(matches!(outcome, ProbeOutcome::Timeout(_)));
    }
}
