//! The transaction orchestrator: sequences application discovery/selection,
//! AFL traversal, offline data authentication, cardholder verification and
//! cryptogram generation, maintaining the TVR across every step. Built
//! around an explicit [`SessionState`] rather than implicit field-nullness
//! checks.

use log::{info, warn};

use crate::apdu;
use crate::crypto::{self, CertificateManager};
use crate::dol_builder::{self, DolContext};
use crate::error::KernelError;
use crate::model::consts::{self, Tvr};
use crate::model::{Application, ApplicationHint, ApplicationInformation, CardInformation, CryptogramType, ProcessingOptions, Terminal, Transaction, TransactionResult};
use crate::pin_asker::PinAsker;
use crate::tlv::{Dol, FieldMap, FieldMapExt, TlvRecord};

const CONTACT_DDF: &[u8] = b"1PAY.SYS.DDF01";
const CONTACTLESS_DDF: &[u8] = b"2PAY.SYS.DDF01";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    ListApplications,
    AwaitSelection,
    Selected,
    Authenticated,
    CardholderVerified,
    CryptogramGenerated,
    Done,
}

impl SessionState {
    fn require(self, expected: SessionState) -> Result<(), KernelError> {
        if self != expected {
            return Err(KernelError::InvalidState(state_name(expected)));
        }
        Ok(())
    }

    fn require_at_least(self, expected: SessionState) -> Result<(), KernelError> {
        if (self as u8) < (expected as u8) {
            return Err(KernelError::InvalidState(state_name(expected)));
        }
        Ok(())
    }
}

fn state_name(state: SessionState) -> &'static str {
    match state {
        SessionState::Init => "Init",
        SessionState::ListApplications => "ListApplications",
        SessionState::AwaitSelection => "AwaitSelection",
        SessionState::Selected => "Selected",
        SessionState::Authenticated => "Authenticated",
        SessionState::CardholderVerified => "CardholderVerified",
        SessionState::CryptogramGenerated => "CryptogramGenerated",
        SessionState::Done => "Done",
    }
}

/// One card session. Exclusively owns the transport for its lifetime;
/// `Drop` always resets the card so an early return or `?` never leaves it
/// PIN-authenticated or mid-chain for the next session.
pub struct Context<T: apdu::Transport, C: CertificateManager> {
    transport: T,
    cert_manager: C,
    terminal: Terminal,
    state: SessionState,
    application: Option<Application>,
    processing_options: Option<ProcessingOptions>,
    card_information: CardInformation,
    tvr: Tvr,
    cvr: u16,
    dac: Option<[u8; 2]>,
    accumulated_sda_data: Vec<u8>,
}

impl<T: apdu::Transport, C: CertificateManager> Context<T, C> {
    pub fn new(transport: T, cert_manager: C, terminal: Terminal) -> Self {
        Context {
            transport,
            cert_manager,
            terminal,
            state: SessionState::Init,
            application: None,
            processing_options: None,
            card_information: CardInformation::default(),
            tvr: Tvr::new(),
            cvr: 0,
            dac: None,
            accumulated_sda_data: Vec::new(),
        }
    }

    pub fn tvr(&self) -> Tvr {
        self.tvr
    }

    pub fn card_information(&self) -> &CardInformation {
        &self.card_information
    }

    /// Discover candidate applications: PSE/PPSE directory SELECT + SFI
    /// traversal if the card exposes one, else AID-hint probing.
    pub fn list_applications(
        &mut self,
        contactless: bool,
        hints: &[ApplicationHint],
    ) -> Result<Vec<ApplicationInformation>, KernelError> {
        self.state.require(SessionState::Init)?;

        let ddf = if contactless { CONTACTLESS_DDF } else { CONTACT_DDF };
        let directory = apdu::select(&mut self.transport, ddf, true)?;

        let mut infos = match directory {
            Some((body, _)) => self.list_from_directory(&body)?,
            None => self.list_from_hints(hints)?,
        };

        infos.sort_by_key(ApplicationInformation::sort_key);
        info!("discovered {} candidate application(s)", infos.len());
        self.state = SessionState::ListApplications;
        Ok(infos)
    }

    fn list_from_directory(&mut self, fci: &[u8]) -> Result<Vec<ApplicationInformation>, KernelError> {
        let fci_map = crate::tlv::decode(fci)?
            .get_template(0x6f)
            .ok_or(KernelError::MissingData(0x6f))??;
        let template = fci_map
            .get_template(0xa5)
            .ok_or(KernelError::MissingData(0xa5))??;
        let sfi = template.get_bytes(0x88).and_then(|b| b.first().copied()).ok_or(KernelError::MissingData(0x88))?;

        let mut infos = Vec::new();
        let mut record = 1u8;
        while let Some(body) = apdu::read_record(&mut self.transport, sfi, record)? {
            let record_map = crate::tlv::decode(&body)?;
            if let Some(entry_template) = record_map.get_template(0x70) {
                let entry_map = entry_template?;
                // Some cards place more than one tag-61 Application
                // Template in a single directory record; only the last one
                // decoded by the FieldMap survives.
                if let Some(entry) = entry_map.get_template(0x61) {
                    infos.push(ApplicationInformation::unmarshal(&entry?)?);
                }
            }
            record += 1;
        }
        Ok(infos)
    }

    fn list_from_hints(&mut self, hints: &[ApplicationHint]) -> Result<Vec<ApplicationInformation>, KernelError> {
        let mut infos = Vec::new();
        let mut seen: Vec<Vec<u8>> = Vec::new();

        for hint in hints {
            let mut first = true;
            loop {
                let selected = apdu::select(&mut self.transport, &hint.name, first)?;
                let Some((body, _)) = selected else { break };
                let fci = crate::tlv::decode(&body)?
                    .get_template(0x6f)
                    .ok_or(KernelError::MissingData(0x6f))??;
                let application = Application::unmarshal(&fci)?;
                if !seen.contains(&application.dedicated_file_name) {
                    seen.push(application.dedicated_file_name.clone());
                    infos.push(ApplicationInformation {
                        name: application.dedicated_file_name,
                        label: application.template.label.unwrap_or_default(),
                        priority: application.template.priority,
                    });
                }
                if !hint.partial {
                    break;
                }
                first = false;
            }
        }
        Ok(infos)
    }

    /// Select one application by AID, run GET PROCESSING OPTIONS, and read
    /// every AFL record into `card_information`, accumulating SDA input
    /// data along the way.
    pub fn select_application(&mut self, aid: &[u8]) -> Result<(), KernelError> {
        self.state.require(SessionState::ListApplications)?;

        let (body, _) = apdu::select(&mut self.transport, aid, true)?.ok_or(KernelError::ApplicationNotFound)?;
        let fci = crate::tlv::decode(&body)?
            .get_template(0x6f)
            .ok_or(KernelError::MissingData(0x6f))??;
        let application = Application::unmarshal(&fci)?;

        let pdol_payload = match &application.template.processing_options_dol {
            Some(pdol) => self.build_dol(pdol),
            None => Vec::new(),
        };

        let response = apdu::get_processing_options(&mut self.transport, pdol_payload)?;
        let processing_options = ProcessingOptions::from_response(&response)?;

        self.accumulated_sda_data.clear();
        self.card_information = CardInformation::default();

        for file in &processing_options.application_file_list.files {
            let mut sda_remaining = file.sda_record_count;
            for record in file.records() {
                let body = apdu::read_record(&mut self.transport, file.sfi, record)?
                    .ok_or(KernelError::MissingData(0x70))?;
                let record_map = crate::tlv::decode(&body)?;
                let template_bytes = record_map.get_bytes(0x70).map(|b| b.to_vec());

                if sda_remaining > 0 {
                    if file.sfi <= 10 {
                        if let Some(bytes) = &template_bytes {
                            self.accumulated_sda_data.extend_from_slice(bytes);
                        }
                    } else {
                        self.accumulated_sda_data.extend_from_slice(&body);
                    }
                    sda_remaining -= 1;
                }

                if let Some(template) = record_map.get_template(0x70) {
                    self.card_information.merge_record(&template?)?;
                } else {
                    self.card_information.merge_record(&record_map)?;
                }
            }
        }

        info!("selected application, AIP={:#06x}", processing_options.application_interchange_profile);
        self.application = Some(application);
        self.processing_options = Some(processing_options);
        self.state = SessionState::Selected;
        Ok(())
    }

    /// Dispatch offline data authentication per AIP. Always returns `Ok`
    /// once the protocol ran to completion; pass/fail lives in TVR.
    pub fn authenticate(&mut self) -> Result<(), KernelError> {
        self.state.require(SessionState::Selected)?;
        let aip = self.processing_options_aip()?;

        if aip & consts::AIP_DDA_SUPPORTED != 0 {
            if let Err(e) = self.run_dda() {
                warn!("DDA failed: {e}");
                self.tvr.set(consts::TVR_DDA_FAILED);
            }
        } else if aip & consts::AIP_SDA_SUPPORTED != 0 {
            if let Err(e) = self.run_sda() {
                warn!("SDA failed: {e}");
                self.tvr.set(consts::TVR_SDA_FAILED);
            }
        } else {
            self.tvr.set(consts::TVR_OFFLINE_NOT_PERFORMED);
        }

        self.state = SessionState::Authenticated;
        Ok(())
    }

    fn run_sda(&mut self) -> Result<(), KernelError> {
        let ci = &self.card_information;
        let rid: [u8; 5] = self
            .application
            .as_ref()
            .and_then(|a| a.dedicated_file_name.get(0..5))
            .ok_or(KernelError::MissingData(0x84))?
            .try_into()
            .map_err(|_| KernelError::MissingData(0x84))?;
        let ca_index = ci.scheme_public_key_index.ok_or(KernelError::MissingData(0x8f))?;
        let certificate = ci.issuer_public_key_certificate.as_deref().ok_or(KernelError::MissingData(0x90))?;
        let remainder = ci.issuer_public_key_remainder.as_deref().unwrap_or(&[]);
        let exponent = ci.issuer_public_key_exponent.as_deref().ok_or(KernelError::MissingData(0x9f32))?;
        let signed_static_data = ci.signed_static_application_data.as_deref().ok_or(KernelError::MissingData(0x93))?;

        let scheme_key = self
            .cert_manager
            .get_scheme_public_key(&rid, ca_index)
            .map_err(|_| KernelError::AuthFailure(crypto::VerifyError::UnknownCaKey { rid, index: ca_index }))?;

        let issuer_key = crypto::recover_issuer_public_key(&scheme_key, certificate, exponent, remainder)?;

        let raw = self.processing_options.as_ref().map(|p| &p.raw);
        let sda_tag_values = match &ci.sda_tags {
            Some(tags) => sda_tag_values(tags, &ci.raw, raw)?,
            None => Vec::new(),
        };

        let dac = crypto::verify_sda(&issuer_key.public_key, signed_static_data, &self.accumulated_sda_data, &sda_tag_values)?;
        self.dac = Some(dac);
        Ok(())
    }

    fn run_dda(&mut self) -> Result<(), KernelError> {
        // ICC key recovery is implemented for completeness, but the
        // dynamic-signature verification it feeds is a deterministic
        // scaffold failure (see crypto::verify_dda).
        let ci = &self.card_information;
        let certificate = ci.icc_public_key_certificate.as_deref().ok_or(KernelError::MissingData(0x9f46))?;
        let remainder = ci.icc_public_key_remainder.as_deref().unwrap_or(&[]);
        let exponent = ci.icc_public_key_exponent.as_deref().ok_or(KernelError::MissingData(0x9f47))?;

        let rid: [u8; 5] = self
            .application
            .as_ref()
            .and_then(|a| a.dedicated_file_name.get(0..5))
            .ok_or(KernelError::MissingData(0x84))?
            .try_into()
            .map_err(|_| KernelError::MissingData(0x84))?;
        let ca_index = ci.scheme_public_key_index.ok_or(KernelError::MissingData(0x8f))?;
        let issuer_certificate = ci.issuer_public_key_certificate.as_deref().ok_or(KernelError::MissingData(0x90))?;
        let issuer_remainder = ci.issuer_public_key_remainder.as_deref().unwrap_or(&[]);
        let issuer_exponent = ci.issuer_public_key_exponent.as_deref().ok_or(KernelError::MissingData(0x9f32))?;

        let scheme_key = self
            .cert_manager
            .get_scheme_public_key(&rid, ca_index)
            .map_err(|_| KernelError::AuthFailure(crypto::VerifyError::UnknownCaKey { rid, index: ca_index }))?;
        let issuer_key = crypto::recover_issuer_public_key(&scheme_key, issuer_certificate, issuer_exponent, issuer_remainder)?;
        let icc_key = crypto::recover_icc_public_key(&issuer_key.public_key, certificate, exponent, remainder)?;

        let ddol_payload = Vec::new();
        let dynamic_response = apdu::internal_authenticate(&mut self.transport, ddol_payload)?;
        crypto::verify_dda(&icc_key.public_key, &dynamic_response)?;
        Ok(())
    }

    /// Offline plaintext PIN verification. A failure sets `TvrCvmFailed`
    /// but does not abort the session — the EMV flow continues online.
    pub fn verify_cardholder(&mut self, pin_asker: &mut dyn PinAsker) -> Result<(), KernelError> {
        self.state.require_at_least(SessionState::Authenticated)?;
        let pin = pin_asker.retrieve_pin().map_err(|_| KernelError::CvmFailed)?;
        match apdu::verify_pin(&mut self.transport, &pin) {
            Ok(()) => {}
            Err(_) => {
                warn!("cardholder verification failed");
                self.tvr.set(consts::TVR_CVM_FAILED);
            }
        }
        self.state = SessionState::CardholderVerified;
        Ok(())
    }

    /// Build the CDOL1 payload from the card's own RiskManagementData (tag
    /// 8C) and request a cryptogram via GENERATE AC.
    pub fn generate_cryptogram(&mut self, tx: &Transaction) -> Result<TransactionResult, KernelError> {
        self.state.require_at_least(SessionState::Authenticated)?;

        let cdol1_bytes = self
            .card_information
            .risk_management_data
            .clone()
            .ok_or(KernelError::MissingData(0x8c))?;
        let cdol1 = Dol::try_from(cdol1_bytes.as_slice())?;
        let payload = self.build_dol_for(&cdol1, tx);

        let kind = consts::AC_ARQC;
        let response = apdu::generate_ac(&mut self.transport, kind, payload)?;
        let fields = crate::tlv::decode(&response)?;
        let fields = fields.get_template(0x77).transpose()?.unwrap_or(fields);

        let cid = fields.get_bytes(0x9f27).and_then(|b| b.first().copied()).ok_or(KernelError::MissingData(0x9f27))?;
        let cryptogram = fields.get_bytes(0x9f26).map(|b| b.to_vec()).ok_or(KernelError::MissingData(0x9f26))?;

        let cryptogram_type = CryptogramType::from_cid(cid);
        let should_go_online = matches!(cryptogram_type, CryptogramType::Arqc)
            || self.tvr.is_set(consts::TVR_FORCED_ONLINE)
            || self.tvr.is_set(consts::TVR_RANDOM_ONLINE);

        info!("cryptogram generated: {cryptogram_type:?}");
        self.state = SessionState::CryptogramGenerated;

        Ok(TransactionResult {
            approved: matches!(cryptogram_type, CryptogramType::Tc),
            should_go_online,
            cryptogram_type,
            cryptogram,
        })
    }

    /// Release the card, resetting it so a subsequent session starts
    /// clean. Idempotent; safe to call more than once (e.g. explicitly then
    /// again from `Drop`).
    pub fn disconnect(&mut self) {
        if self.state == SessionState::Done {
            return;
        }
        let _ = self.transport.reset();
        self.state = SessionState::Done;
    }

    fn processing_options_aip(&self) -> Result<u16, KernelError> {
        self.processing_options
            .as_ref()
            .map(|p| p.application_interchange_profile)
            .ok_or(KernelError::MissingData(0x82))
    }

    fn build_dol(&self, dol: &Dol) -> Vec<u8> {
        let empty = FieldMap::new();
        let ctx = DolContext {
            terminal: &self.terminal,
            transaction: &Transaction {
                amount_authorized: 0,
                amount_other: 0,
                date: [0, 0, 0],
                transaction_type: 0,
            },
            tvr: self.tvr,
            cvr: self.cvr,
            data_authentication_code: self.dac,
            card_information_raw: &self.card_information.raw,
            processing_options_raw: self.processing_options.as_ref().map(|p| &p.raw).unwrap_or(&empty),
        };
        dol_builder::build(dol, &ctx)
    }

    fn build_dol_for(&self, dol: &Dol, tx: &Transaction) -> Vec<u8> {
        let empty = FieldMap::new();
        let ctx = DolContext {
            terminal: &self.terminal,
            transaction: tx,
            tvr: self.tvr,
            cvr: self.cvr,
            data_authentication_code: self.dac,
            card_information_raw: &self.card_information.raw,
            processing_options_raw: self.processing_options.as_ref().map(|p| &p.raw).unwrap_or(&empty),
        };
        dol_builder::build(dol, &ctx)
    }
}

impl<T: apdu::Transport, C: CertificateManager> Drop for Context<T, C> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Concatenate the raw value bytes of each tag in `tags`, searching
/// `primary` then `secondary` (first hit wins). A missing tag fails
/// `MissingSdaTag`.
fn sda_tag_values(
    tags: &crate::tlv::TagList,
    primary: &FieldMap,
    secondary: Option<&FieldMap>,
) -> Result<Vec<u8>, KernelError> {
    let mut out = Vec::new();
    for &tag in &tags.tags {
        let containers: Vec<&FieldMap> = match secondary {
            Some(s) => vec![primary, s],
            None => vec![primary],
        };
        let value = crate::tlv::pick(tag, &containers)
            .and_then(|c| c.get_bytes(tag))
            .ok_or(KernelError::AuthFailure(crypto::VerifyError::MissingSdaTag(tag)))?;
        out.extend_from_slice(value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PublicKey;
    use std::collections::VecDeque;

    struct StubTransport {
        replies: VecDeque<Vec<u8>>,
    }

    impl apdu::Transport for StubTransport {
        fn transmit_raw(&mut self, _apdu: &[u8]) -> Result<Vec<u8>, KernelError> {
            self.replies.pop_front().ok_or_else(|| KernelError::CardTransport("stub exhausted".to_string()))
        }
    }

    struct StubCertificateManager;
    impl CertificateManager for StubCertificateManager {
        fn get_scheme_public_key(&self, _rid: &[u8], _index: u8) -> anyhow::Result<PublicKey> {
            Err(anyhow::anyhow!("no keys in stub"))
        }
    }

    fn sw(data: &[u8], sw1: u8, sw2: u8) -> Vec<u8> {
        let mut out = data.to_vec();
        out.push(sw1);
        out.push(sw2);
        out
    }

    #[test]
    fn out_of_order_select_is_rejected() {
        let transport = StubTransport { replies: VecDeque::new() };
        let mut ctx = Context::new(transport, StubCertificateManager, Terminal::default());
        let err = ctx.select_application(b"anything").unwrap_err();
        assert!(matches!(err, KernelError::InvalidState(_)));
    }

    #[test]
    fn list_applications_falls_back_to_hints_when_no_directory() {
        let transport = StubTransport {
            replies: VecDeque::from([
                sw(&[], 0x6a, 0x82), // PSE not found
                sw(&hex::decode("6f098407a0000000031010").unwrap(), 0x90, 0x00), // SELECT by hint succeeds
            ]),
        };
        let mut ctx = Context::new(transport, StubCertificateManager, Terminal::default());
        let infos = ctx
            .list_applications(
                false,
                &[ApplicationHint {
                    name: hex::decode("a0000000031010").unwrap(),
                    partial: false,
                }],
            )
            .unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].name, hex::decode("a0000000031010").unwrap());
    }

    #[test]
    fn disconnect_is_idempotent_and_runs_on_drop() {
        let transport = StubTransport { replies: VecDeque::new() };
        let mut ctx = Context::new(transport, StubCertificateManager, Terminal::default());
        ctx.disconnect();
        ctx.disconnect();
        assert_eq!(ctx.state, SessionState::Done);
    }
}
