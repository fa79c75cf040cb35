/// State of the "register attendance" control.
///
/// `armed` follows the captured photo; `busy` covers an in-flight request and
/// is cleared by dropping the [`InFlight`] guard, whatever way the request ends.
#[derive(Debug, Default)]
pub struct SubmitControl {
    armed: bool,
    busy: bool,
}

impl SubmitControl {
    pub fn is_enabled(&self) -> bool {
        self.armed && !self.busy
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn begin(&mut self) -> Option<InFlight<'_>> {
        if self.busy {
            return None;
        }
        self.busy = true;
        Some(InFlight { control: self })
    }

    pub fn label(&self) -> &'static str {
        if self.busy { "Registrando..." } else { "Registrar Asistencia" }
    }
}

pub struct InFlight<'a> {
    control: &'a mut SubmitControl,
}

impl InFlight<'_> {
    pub fn control(&self) -> &SubmitControl {
        self.control
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.control.busy = false;
    }
}
