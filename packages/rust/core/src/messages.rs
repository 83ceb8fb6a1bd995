//! Operator-facing text, per locale.
//!
//! Command strings and the date button labels are matched against operator
//! input, so changing them changes what the bot accepts.

use chrono::NaiveDate;

use pilelog_shared::{Locale, format_date};

/// Localized message catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    locale: Locale,
}

impl Messages {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn welcome(&self) -> String {
        match self.locale {
            Locale::Ru => "Добро пожаловать в журнал забивки свай!\n\n\
                           Используйте команды:\n\
                           /newrecord - начать новую запись\n\
                           /help - помощь"
                .into(),
            Locale::En => "Welcome to the pile driving log!\n\n\
                           Commands:\n\
                           /newrecord - start a new record\n\
                           /help - help"
                .into(),
        }
    }

    pub fn help(&self) -> String {
        match self.locale {
            Locale::Ru => "Команды бота:\n\
                           /newrecord - начать новую запись о забивке сваи\n\
                           /help - показать эту справку"
                .into(),
            Locale::En => "Bot commands:\n\
                           /newrecord - start a new pile driving record\n\
                           /help - show this help"
                .into(),
        }
    }

    pub fn guidance(&self) -> String {
        match self.locale {
            Locale::Ru => {
                "Используйте /newrecord для начала новой записи или /help для справки.".into()
            }
            Locale::En => "Use /newrecord to start a new record or /help for help.".into(),
        }
    }

    pub fn no_piles(&self) -> String {
        match self.locale {
            Locale::Ru => "Нет доступных свай для забивки.".into(),
            Locale::En => "There are no piles available for driving.".into(),
        }
    }

    pub fn piles_unavailable(&self, error: &str) -> String {
        match self.locale {
            Locale::Ru => format!("Не удалось получить список свай: {error}"),
            Locale::En => format!("Could not fetch the pile list: {error}"),
        }
    }

    pub fn choose_group(&self) -> String {
        match self.locale {
            Locale::Ru => "Выберите группу свай:".into(),
            Locale::En => "Choose a pile group:".into(),
        }
    }

    pub fn choose_pile(&self) -> String {
        match self.locale {
            Locale::Ru => "Выберите номер сваи:".into(),
            Locale::En => "Choose a pile number:".into(),
        }
    }

    pub fn invalid_group(&self) -> String {
        match self.locale {
            Locale::Ru => "Неверный выбор группы. Попробуйте еще раз.".into(),
            Locale::En => "Unknown group. Please try again.".into(),
        }
    }

    pub fn invalid_pile(&self) -> String {
        match self.locale {
            Locale::Ru => {
                "Неверный номер сваи. Пожалуйста, выберите из предложенных вариантов.".into()
            }
            Locale::En => "Unknown pile number. Please choose one of the offered options.".into(),
        }
    }

    pub fn choose_date(&self) -> String {
        match self.locale {
            Locale::Ru => "Выберите дату забивки:".into(),
            Locale::En => "Choose the driving date:".into(),
        }
    }

    pub fn today(&self) -> &'static str {
        match self.locale {
            Locale::Ru => "Сегодня",
            Locale::En => "Today",
        }
    }

    pub fn yesterday(&self) -> &'static str {
        match self.locale {
            Locale::Ru => "Вчера",
            Locale::En => "Yesterday",
        }
    }

    pub fn invalid_date(&self) -> String {
        match self.locale {
            Locale::Ru => "Пожалуйста, выберите одну из предложенных дат".into(),
            Locale::En => "Please choose one of the offered dates".into(),
        }
    }

    pub fn date_chosen(&self, date: NaiveDate) -> String {
        let date = format_date(date);
        match self.locale {
            Locale::Ru => format!(
                "Выбрана дата: {date}\n\
                 Введите отметку верха головы сваи (в милиметрах, например, 12750):"
            ),
            Locale::En => format!(
                "Date selected: {date}\n\
                 Enter the pile head elevation (in millimetres, e.g. 12750):"
            ),
        }
    }

    pub fn invalid_number(&self) -> String {
        match self.locale {
            Locale::Ru => {
                "Неверный формат числа. Пожалуйста, введите отметку в милиметрах (например, 12750):"
                    .into()
            }
            Locale::En => {
                "Invalid number. Please enter the elevation in millimetres (e.g. 12750):".into()
            }
        }
    }

    pub fn enter_operator(&self) -> String {
        match self.locale {
            Locale::Ru => "Введите имя оператора (или /skip чтобы пропустить):".into(),
            Locale::En => "Enter the operator name (or /skip to leave it empty):".into(),
        }
    }

    pub fn enter_notes(&self) -> String {
        match self.locale {
            Locale::Ru => "Введите дополнительную информацию (или /skip чтобы пропустить):".into(),
            Locale::En => "Enter any additional notes (or /skip to leave them empty):".into(),
        }
    }

    pub fn submitted(&self, pile_number: &str, date: NaiveDate, fact_pile_head: i64) -> String {
        let date = format_date(date);
        match self.locale {
            Locale::Ru => format!(
                "Данные успешно отправлены!\n\n\
                 Номер сваи: {pile_number}\n\
                 Дата забивки: {date}\n\
                 Отметка верха: {fact_pile_head} мм"
            ),
            Locale::En => format!(
                "Record submitted!\n\n\
                 Pile number: {pile_number}\n\
                 Driving date: {date}\n\
                 Head elevation: {fact_pile_head} mm"
            ),
        }
    }

    pub fn submit_failed(&self, server_message: &str) -> String {
        match self.locale {
            Locale::Ru => format!("Сервер вернул ошибку: {server_message}"),
            Locale::En => format!("The server returned an error: {server_message}"),
        }
    }
}
