//! User-facing texts and keyboards. Staff use the bot in Russian.

use crate::config::AccountConfig;
use crate::domain::amount::{Amount, AmountError};
use crate::domain::event::callback;
use crate::domain::ports::{Button, Markup};
use crate::domain::service::{ServiceChoice, ServiceSelection, ServiceTextError};
use crate::error::PaymentError;

/// Preset amounts offered as buttons: 500..=1800 CZK in steps of 100.
pub const PRESET_AMOUNTS: std::ops::RangeInclusive<u32> = 500..=1800;
const PRESET_STEP: usize = 100;
const PRESETS_PER_ROW: usize = 3;

pub const MENU_CREATE_QR: &str = "💰 Создать QR-код для оплаты";
pub const MENU_ACCOUNT_INFO: &str = "ℹ️ Реквизиты счета";
pub const MENU_HELP: &str = "❓ Помощь";

pub fn amount_prompt() -> String {
    "🌿 Создание QR-кода для оплаты\n\n\
     1️⃣ Выберите сумму из списка или введите свою\n\
     2️⃣ Выберите услугу\n\
     3️⃣ Подтвердите и покажите QR-код клиенту\n\n\
     👇 Выберите сумму:"
        .to_string()
}

pub fn amount_keyboard() -> Markup {
    let presets: Vec<u32> = PRESET_AMOUNTS.step_by(PRESET_STEP).collect();
    let mut rows: Vec<Vec<Button>> = presets
        .chunks(PRESETS_PER_ROW)
        .map(|row| {
            row.iter()
                .map(|amount| Button::new(format!("{amount} CZK"), callback::amount(amount)))
                .collect()
        })
        .collect();
    rows.push(vec![Button::new(
        "✏️ Ввести свою сумму",
        callback::CUSTOM_AMOUNT,
    )]);
    Markup::Inline(rows)
}

pub fn custom_amount_prompt() -> String {
    "✏️ Введите свою сумму\n\n\
     📝 Используйте:\n\
     • Целые числа: 500, 1000\n\
     • Десятичные: 500.50, 1000,25\n\n\
     Минимум 0,01 CZK, максимум 1 000 000 CZK."
        .to_string()
}

pub fn service_prompt(amount: Amount) -> String {
    format!("💰 Сумма: {amount}\n\n🌿 Выберите услугу для указания в платеже:")
}

pub fn service_keyboard(choices: &[ServiceChoice]) -> Markup {
    let mut rows: Vec<Vec<Button>> = choices
        .iter()
        .map(|choice| {
            let label = match choice {
                ServiceChoice::Catalog(service) => service.display_label.clone(),
                ServiceChoice::CustomText => "✏️ Ввести свою услугу".to_string(),
                ServiceChoice::NoService => "❌ Без указания услуги".to_string(),
            };
            vec![Button::new(label, callback::service(choice.key()))]
        })
        .collect();
    rows.push(vec![Button::new(
        "◀️ Назад к выбору суммы",
        callback::BACK_TO_AMOUNT,
    )]);
    Markup::Inline(rows)
}

pub fn custom_service_prompt(amount: Amount) -> String {
    format!(
        "💰 Сумма: {amount}\n\n\
         ✏️ Напишите название услуги (от 2 до 50 символов).\n\
         Оно будет указано в сообщении платежа заглавными буквами."
    )
}

pub fn custom_service_keyboard() -> Markup {
    Markup::Inline(vec![vec![Button::new(
        "◀️ Назад к выбору услуги",
        callback::BACK_TO_SERVICE,
    )]])
}

fn service_line(selection: &ServiceSelection) -> String {
    selection
        .display_label
        .clone()
        .unwrap_or_else(|| "Без указания услуги".to_string())
}

pub fn confirmation(amount: Amount, selection: &ServiceSelection, account: &AccountConfig) -> String {
    format!(
        "📋 Подтверждение платежа\n\n\
         💰 Сумма: {amount}\n\
         🎯 Услуга: {}\n\
         👤 Получатель: {}\n\n\
         Все верно? Создать QR-код?",
        service_line(selection),
        account.owner_name
    )
}

pub fn confirmation_keyboard() -> Markup {
    Markup::Inline(vec![
        vec![
            Button::new("✅ Создать QR-код", callback::CONFIRM),
            Button::new("❌ Отменить", callback::CANCEL),
        ],
        vec![Button::new("◀️ Изменить услугу", callback::BACK_TO_SERVICE)],
    ])
}

pub fn qr_caption(amount: Amount, selection: &ServiceSelection, account: &AccountConfig) -> String {
    let service = selection
        .wire_text
        .as_ref()
        .map(|text| format!("🛍️ Услуга: {text}\n"))
        .unwrap_or_default();
    let account_line = account_number_line(account, "🏦 Счет");
    format!(
        "🌿 QR-код для оплаты услуг салона\n\n\
         💰 Сумма: {amount}\n\
         {service}\
         👤 Получатель: {}\n\
         {account_line}\n\
         📱 Покажите этот QR-код клиенту",
        account.owner_name
    )
}

/// `"<label>: <number>\n"`, or nothing when no domestic account number is configured.
fn account_number_line(account: &AccountConfig, label: &str) -> String {
    if account.account_number.is_empty() {
        String::new()
    } else {
        format!("{label}: {}\n", account.account_number)
    }
}

pub fn cancelled() -> String {
    "❌ Создание QR-кода отменено.".to_string()
}

pub fn emission_failed() -> String {
    "❌ Не удалось создать QR-код. Начните заново.".to_string()
}

pub fn account_info(account: &AccountConfig) -> String {
    format!(
        "📋 Реквизиты счета салона\n\n\
         👤 Получатель: {}\n\
         {}\
         🌍 IBAN: {}\n\
         💱 Валюта: {}",
        account.owner_name,
        account_number_line(account, "🏦 Номер счета"),
        account.iban,
        account.currency
    )
}

pub fn unknown_command() -> String {
    "❓ Неизвестная команда!\n\n👇 Используйте кнопки ниже для навигации:".to_string()
}

pub fn help() -> String {
    "📋 Инструкция для сотрудника\n\n\
     1️⃣ Нажмите «💰 Создать QR-код для оплаты»\n\
     2️⃣ Выберите сумму или введите свою (например: 1400)\n\
     3️⃣ Выберите услугу, впишите свою или «Без указания услуги»\n\
     4️⃣ Подтвердите данные\n\
     5️⃣ Покажите QR-код клиенту, он сканирует его в банковском приложении\n\n\
     /cancel — отменить текущую операцию"
        .to_string()
}

pub fn welcome() -> String {
    "🌿 Добро пожаловать в систему оплаты салона красоты!\n\n\
     Этот бот создает QR-коды для оплаты услуг через банковское приложение.\n\n\
     👇 Выберите действие:"
        .to_string()
}

/// Explains a rejected input so staff know exactly what to fix.
pub fn rejection(error: &PaymentError) -> String {
    match error {
        PaymentError::Amount(AmountError::NotANumber(_)) => {
            "❌ Неверный формат суммы. Введите число, например 1250 или 1250,50.".to_string()
        }
        PaymentError::Amount(AmountError::NonPositive) => {
            "❌ Сумма должна быть больше нуля.".to_string()
        }
        PaymentError::Amount(AmountError::TooLarge) => {
            "❌ Сумма слишком большая. Максимум: 1 000 000 CZK.".to_string()
        }
        PaymentError::Amount(AmountError::TooManyDecimals) => {
            "❌ Допускается не более двух знаков после запятой.".to_string()
        }
        PaymentError::ServiceText(ServiceTextError::TooShort) => {
            "❌ Название услуги слишком короткое (минимум 2 символа).".to_string()
        }
        PaymentError::ServiceText(ServiceTextError::TooLong) => {
            "❌ Название услуги слишком длинное (максимум 50 символов).".to_string()
        }
        PaymentError::ServiceText(ServiceTextError::ForbiddenCharacter(c)) => {
            format!("❌ Символ «{c}» нельзя использовать в названии услуги.")
        }
        PaymentError::UnknownService(_) | PaymentError::ServiceNotOffered { .. } => {
            "❌ Эта услуга недоступна для выбранной суммы. Выберите из списка.".to_string()
        }
        PaymentError::OutOfOrder { .. } | PaymentError::UnknownCallback(_) => {
            "❓ Это действие сейчас недоступно. Нажмите «💰 Создать QR-код для оплаты», \
             чтобы начать заново."
                .to_string()
        }
        _ => emission_failed(),
    }
}
