use std::fmt::{Display, Formatter, Result};

use crate::models::template::Template;

/// Lifecycle events published by the user service that have a dedicated template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserAction {
    Registered,
    Login,
    RecoveryLink,
    PasswordUpdated,
}

impl UserAction {
    pub const ALL: [UserAction; 4] = [
        UserAction::Registered,
        UserAction::Login,
        UserAction::RecoveryLink,
        UserAction::PasswordUpdated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserAction::Registered => "user.registered",
            UserAction::Login => "user.login",
            UserAction::RecoveryLink => "user.recovery.link",
            UserAction::PasswordUpdated => "user.password.updated",
        }
    }

    pub fn template(&self) -> Template {
        match self {
            UserAction::Registered => Template {
                subject: "Registro completado",
                body: "Hola {full_name},\n\n\
                       Gracias por registrarte en nuestro sistema. Tu cuenta ha sido creada correctamente.\n\n\
                       Si tienes alguna duda, responde a este correo.\n\n\
                       Saludos,\nEl equipo",
            },
            UserAction::Login => Template {
                subject: "Notificación de autenticación",
                body: "Hola {full_name},\n\n\
                       Se ha detectado una autenticación en tu cuenta. Si fuiste tú, ignora este mensaje. \
                       Si no reconoces esta actividad, por favor contacta soporte inmediatamente.\n\n\
                       Saludos,\nEl equipo",
            },
            UserAction::RecoveryLink => Template {
                subject: "Solicitud de recuperación de claves",
                body: "Hola {full_name},\n\n\
                       Hemos recibido una solicitud para recuperar tu contraseña. Si fuiste tú, sigue las instrucciones \
                       en la plataforma para restablecerla. Si no solicitaste esto, ignora el mensaje.\n\n\
                       Saludos,\nEl equipo",
            },
            UserAction::PasswordUpdated => Template {
                subject: "Actualización de claves realizada",
                body: "Hola {full_name},\n\n\
                       Te confirmamos que la contraseña asociada a tu cuenta ha sido actualizada correctamente. \
                       Si no realizaste este cambio, contacta soporte de inmediato.\n\n\
                       Saludos,\nEl equipo",
            },
        }
    }
}

impl Display for UserAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.as_str())
    }
}
