//! Perícia workflow status engine
//!
//! Statuses are tenant catalog rows; the engine only knows their codes.
//! It answers two questions: may a perícia move from one code to another,
//! and which workflow flags does a code imply.

use serde::Serialize;

/// Workflow status codes understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    NovaNomeacao,
    Avaliar,
    Majorar,
    AguardandoAceiteHonorarios,
    FazerIndireta,
    AgendarData,
    Telepericia,
    DataAgendada,
    Ausente,
    AusenciaInformada,
    EmLaudo,
    EnviarLaudo,
    Esclarecimentos,
    AguardandoPag,
    RecebidoParcialmente,
    Finalizada,
    Cancelada,
}

use WorkflowStatus::*;

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 17] = [
        NovaNomeacao,
        Avaliar,
        Majorar,
        AguardandoAceiteHonorarios,
        FazerIndireta,
        AgendarData,
        Telepericia,
        DataAgendada,
        Ausente,
        AusenciaInformada,
        EmLaudo,
        EnviarLaudo,
        Esclarecimentos,
        AguardandoPag,
        RecebidoParcialmente,
        Finalizada,
        Cancelada,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NovaNomeacao => "NOVA_NOMEACAO",
            Avaliar => "AVALIAR",
            Majorar => "MAJORAR",
            AguardandoAceiteHonorarios => "AGUARDANDO_ACEITE_HONORARIOS",
            FazerIndireta => "FAZER_INDIRETA",
            AgendarData => "AGENDAR_DATA",
            Telepericia => "TELEPERICIA",
            DataAgendada => "DATA_AGENDADA",
            Ausente => "AUSENTE",
            AusenciaInformada => "AUSENCIA_INFORMADA",
            EmLaudo => "EM_LAUDO",
            EnviarLaudo => "ENVIAR_LAUDO",
            Esclarecimentos => "ESCLARECIMENTOS",
            AguardandoPag => "AGUARDANDO_PAG",
            RecebidoParcialmente => "RECEBIDO_PARCIALMENTE",
            Finalizada => "FINALIZADA",
            Cancelada => "CANCELADA",
        }
    }

    /// Codes reachable from `self`
    pub fn next(&self) -> &'static [WorkflowStatus] {
        match self {
            NovaNomeacao => &[
                Avaliar,
                Majorar,
                AguardandoAceiteHonorarios,
                FazerIndireta,
                AgendarData,
                Telepericia,
                Cancelada,
            ],
            Avaliar => &[
                Majorar,
                AguardandoAceiteHonorarios,
                FazerIndireta,
                AgendarData,
                Telepericia,
                Cancelada,
            ],
            Majorar => &[Avaliar, AguardandoAceiteHonorarios, AgendarData, Cancelada],
            AguardandoAceiteHonorarios => &[Majorar, AgendarData, Telepericia, Cancelada],
            FazerIndireta => &[EmLaudo, EnviarLaudo, Cancelada],
            AgendarData => &[DataAgendada, Telepericia, Cancelada],
            Telepericia => &[DataAgendada, AgendarData, Cancelada],
            DataAgendada => &[
                EmLaudo,
                EnviarLaudo,
                Ausente,
                AusenciaInformada,
                AgendarData,
                Cancelada,
            ],
            Ausente => &[AgendarData, AusenciaInformada, Finalizada],
            AusenciaInformada => &[AgendarData, Finalizada],
            EmLaudo => &[EnviarLaudo],
            EnviarLaudo => &[EmLaudo, Esclarecimentos, AguardandoPag],
            Esclarecimentos => &[EnviarLaudo, AguardandoPag],
            AguardandoPag => &[RecebidoParcialmente, Esclarecimentos, Finalizada],
            RecebidoParcialmente => &[AguardandoPag, Finalizada],
            Finalizada | Cancelada => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Finalizada | Cancelada)
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        WorkflowStatus::ALL
            .into_iter()
            .find(|c| c.as_str() == upper)
            .ok_or_else(|| format!("Unknown status code: {}", s))
    }
}

/// Whether a perícia currently at `from` may move to `to`.
///
/// A perícia without a status may take any status. Re-applying the
/// current status is always allowed.
pub fn is_transition_allowed(from: Option<WorkflowStatus>, to: WorkflowStatus) -> bool {
    match from {
        None => true,
        Some(from) if from == to => true,
        Some(from) => from.next().contains(&to),
    }
}

/// Workflow flags implied by a status; `None` leaves the flag unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DerivedFlags {
    pub agendada: Option<bool>,
    pub laudo_enviado: Option<bool>,
    pub finalizada: Option<bool>,
}

pub fn derive_flags(code: WorkflowStatus) -> DerivedFlags {
    let flags = |agendada, laudo_enviado, finalizada| DerivedFlags {
        agendada,
        laudo_enviado,
        finalizada,
    };

    match code {
        NovaNomeacao | Avaliar | Majorar | AguardandoAceiteHonorarios => {
            flags(Some(false), Some(false), Some(false))
        }
        FazerIndireta => flags(None, Some(false), Some(false)),
        AgendarData | Telepericia | Ausente | AusenciaInformada => {
            flags(Some(false), None, Some(false))
        }
        DataAgendada => flags(Some(true), None, Some(false)),
        EmLaudo | EnviarLaudo => flags(None, Some(false), Some(false)),
        Esclarecimentos | AguardandoPag | RecebidoParcialmente => {
            flags(None, Some(true), Some(false))
        }
        Finalizada | Cancelada => flags(None, None, Some(true)),
    }
}
