//! SPI transfer settings and the multi-report SPI transfer engine.

use crate::consts::{cmd, engine, offsets, spi, status};
use crate::device::Mcp2210;
use crate::error::{Error, Result};
use crate::report::{Command, NvramSection, Report};
use crate::settings::{ChipStatus, SettingsTarget, SpiTransferSettings};
use crate::transport::HidChannel;
use log::{debug, trace, warn};

/// Builds one SPI transfer report carrying up to 60 data bytes.
fn chunk_report(chunk: &[u8]) -> Report {
    let mut report = Report::new(Command::SpiTransfer);
    report.set_u8(offsets::SPI_TX_LEN, chunk.len() as u8);
    report.set_bytes(offsets::SPI_DATA, chunk);
    report
}

impl<C: HidChannel> Mcp2210<C> {
    // --- SPI Settings ---

    pub fn read_spi_settings(&mut self, target: SettingsTarget) -> Result<SpiTransferSettings> {
        let request = Report::new(target.get_command(Command::GetSpiSettings, NvramSection::Spi));
        let response = self.transfer(&request)?;
        let settings = SpiTransferSettings::decode(&response)?;
        debug!("Read {:?} SPI settings: {:?}", target, settings);
        Ok(settings)
    }

    pub fn write_spi_settings(
        &mut self,
        target: SettingsTarget,
        settings: &SpiTransferSettings,
    ) -> Result<()> {
        debug!("Writing {:?} SPI settings: {:?}", target, settings);
        let mut request =
            Report::new(target.set_command(Command::SetSpiSettings, NvramSection::Spi));
        settings.encode_into(&mut request);
        self.transfer(&request)?;
        Ok(())
    }

    // --- SPI Transfers ---

    /// Clocks `tx` out on the SPI bus as one transaction using the current
    /// SPI settings, and returns the bytes clocked in.
    pub fn spi_transfer(&mut self, tx: &[u8]) -> Result<Vec<u8>> {
        if tx.is_empty() {
            return Ok(Vec::new());
        }
        check_transfer_len(tx.len())?;
        let mut settings = self.read_spi_settings(SettingsTarget::Current)?;
        self.spi_transfer_with(&mut settings, tx)
    }

    /// Like [`spi_transfer`](Self::spi_transfer), but with caller-supplied
    /// settings. `bytes_per_transaction` is overwritten with `tx.len()`.
    ///
    /// Chunks rejected with "bus not available" or "transfer in progress"
    /// are resent. Each report exchange counts against
    /// [`TransferConfig::max_attempts`](crate::TransferConfig); running out
    /// yields [`Error::TransferTimeout`]. A failed transfer is not cancelled;
    /// call [`cancel_spi_transfer`](Self::cancel_spi_transfer) if needed.
    pub fn spi_transfer_with(
        &mut self,
        settings: &mut SpiTransferSettings,
        tx: &[u8],
    ) -> Result<Vec<u8>> {
        if tx.is_empty() {
            return Ok(Vec::new());
        }
        check_transfer_len(tx.len())?;

        settings.bytes_per_transaction = tx.len() as u16;
        self.write_spi_settings(SettingsTarget::Current, settings)?;

        let total = tx.len();
        let max_attempts = self.config.max_attempts;
        let mut sent = 0usize;
        let mut rx = Vec::with_capacity(total);
        let mut attempts = 0u32;
        let mut finished = false;
        debug!("SPI transfer of {} bytes started", total);

        // After the last chunk is accepted, keep polling with empty reports
        // until the engine reports the end of the transaction.
        while sent < total || (!finished && rx.len() < total) {
            if attempts >= max_attempts {
                warn!(
                    "SPI transfer gave up after {} attempts ({} of {} bytes sent)",
                    attempts, sent, total
                );
                return Err(Error::TransferTimeout {
                    attempts,
                    remaining: total - sent,
                });
            }
            attempts += 1;

            let end = (sent + spi::MAX_CHUNK_LEN).min(total);
            let chunk = &tx[sent..end];
            let response = self.exchange_raw(&chunk_report(chunk))?;

            match response.status() {
                status::SUCCESS => {
                    sent = end;
                    let engine_status = response.u8_at(offsets::SPI_ENGINE_STATUS);
                    match engine_status {
                        engine::DATA_RECEIVED | engine::FINISHED => {
                            let len = usize::from(response.u8_at(offsets::SPI_RX_LEN));
                            if len > spi::MAX_CHUNK_LEN {
                                return Err(Error::InvalidReport(format!(
                                    "SPI response claims {} data bytes",
                                    len
                                )));
                            }
                            let len = len.min(total - rx.len());
                            rx.extend_from_slice(response.bytes_at(offsets::SPI_DATA, len));
                            trace!("SPI received {} bytes ({} total)", len, rx.len());
                            finished = engine_status == engine::FINISHED;
                        }
                        engine::STARTED_NO_DATA => {}
                        other => warn!("Unexpected SPI engine status 0x{:02X}", other),
                    }
                }
                status::BUS_NOT_AVAILABLE | status::TRANSFER_IN_PROGRESS => {
                    trace!(
                        "SPI chunk at offset {} not accepted (0x{:02X}), retrying",
                        sent,
                        response.status()
                    );
                }
                other => {
                    warn!("SPI transfer failed with status 0x{:02X}", other);
                    return Err(Error::CommandFailed {
                        command: cmd::SPI_TRANSFER,
                        status: other,
                    });
                }
            }
        }

        debug!(
            "SPI transfer finished: {} bytes sent, {} received, {} attempts",
            sent,
            rx.len(),
            attempts
        );
        Ok(rx)
    }

    /// Aborts the SPI transfer in progress and returns the chip status.
    pub fn cancel_spi_transfer(&mut self) -> Result<ChipStatus> {
        debug!("Cancelling SPI transfer");
        let response = self.transfer(&Report::new(Command::CancelSpiTransfer))?;
        Ok(ChipStatus::decode(&response))
    }

    /// Releases the SPI bus to an external master, driving the bus release
    /// acknowledge pin to `ack_value`.
    pub fn release_spi_bus(&mut self, ack_value: bool) -> Result<()> {
        debug!("Releasing SPI bus (ack value {})", ack_value);
        let mut request = Report::new(Command::ReleaseSpiBus);
        request.set_u8(offsets::RELEASE_ACK_VALUE, u8::from(ack_value));
        self.transfer(&request)?;
        Ok(())
    }
}

fn check_transfer_len(len: usize) -> Result<()> {
    if len > spi::MAX_TRANSFER_LEN {
        return Err(Error::OperationTooLarge {
            max: spi::MAX_TRANSFER_LEN,
            actual: len,
        });
    }
    Ok(())
}
