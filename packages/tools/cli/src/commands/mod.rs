//! CLI 명령어 구현

pub mod ddl;
pub mod demo;
pub mod render;
pub mod scenarios;

use serde::Serialize;

use crate::tutorial::{self, Scenario};

/// JSON 출력
pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// 이름으로 시나리오 선택 (없으면 전체)
pub(crate) fn select_scenarios(name: Option<&str>) -> anyhow::Result<Vec<&'static Scenario>> {
    match name {
        Some(name) => {
            let scenario = tutorial::find(name).ok_or_else(|| {
                anyhow::anyhow!("Unknown scenario '{}'. Use 'qk scenarios' to list them.", name)
            })?;
            Ok(vec![scenario])
        }
        None => Ok(tutorial::scenarios().iter().collect()),
    }
}
