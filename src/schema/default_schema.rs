use super::DataType;

/// 数据库中还没有数据时使用的默认属性定义
pub const DEFAULT_PROPERTIES: [(&str, DataType); 67] = [
    ("Vehicle_CurrentLocation_Latitude", DataType::Double),
    ("Vehicle_CurrentLocation_Longitude", DataType::Double),
    ("Vehicle_Powertrain_Battery_StateOfCharge_Displayed", DataType::Double),
    ("Vehicle_Powertrain_BatteryHeaterTemperature1", DataType::Double),
    ("Vehicle_Powertrain_MinDeterioration", DataType::Double),
    ("Vehicle_Powertrain_MinDeteriorationCellNo", DataType::Double),
    ("Vehicle_Powertrain_Battery_BatteryAvailableChargePower", DataType::Double),
    ("Vehicle_Powertrain_Battery_BatteryAvailableDischargePower", DataType::Double),
    ("Vehicle_Powertrain_Battery_StateOfHealth", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_MinCellVoltage", DataType::Double),
    ("Vehicle_Powertrain_Battery_StateOfChargeBMS", DataType::Double),
    ("Vehicle_Powertrain_Battery_hasActiveDTC", DataType::Boolean),
    ("Vehicle_Powertrain_Battery_Module_MinTemperature", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_MaxTemperature", DataType::Double),
    ("Vehicle_Powertrain_BatteryVoltageAuxillary", DataType::Double),
    ("Vehicle_Powertrain_BatteryFanFeedback", DataType::Double),
    ("Vehicle_Powertrain_BatteryFanStatus", DataType::Double),
    ("Vehicle_Powertrain_Battery_FanRunning", DataType::Boolean),
    ("Vehicle_Powertrain_NormalChargePort", DataType::Double),
    ("Vehicle_Powertrain_RapidChargePort", DataType::Double),
    ("Vehicle_TotalOperatingTime", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_MinCellVoltageCellNumber", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_MaxCellVoltageCellNumber", DataType::Double),
    ("Vehicle_Powertrain_Battery_Charging_IsCharging", DataType::Boolean),
    ("Vehicle_Powertrain_BMSMainRelay", DataType::Double),
    ("Vehicle_Powertrain_BMSIgnition", DataType::Double),
    ("Vehicle_Powertrain_Battery_BatteryDCVoltage", DataType::Double),
    ("Vehicle_Powertrain_Battery_BatteryCurrent", DataType::Double),
    ("Vehicle_InCabinTemperature", DataType::Double),
    ("Vehicle_OutsideAirTemperature", DataType::Double),
    ("Vehicle_Speed", DataType::Double),
    ("Vehicle_Chassis_Axle_LeftFrontTirePressure", DataType::Double),
    ("Vehicle_Chassis_Axle_LeftFrontTireTemperature", DataType::Double),
    ("Vehicle_Chassis_Axle_LeftRearTirePressure", DataType::Double),
    ("Vehicle_Chassis_Axle_LeftRearTireTemperature", DataType::Double),
    ("Vehicle_Chassis_Axle_RightFrontTirePressure", DataType::Double),
    ("Vehicle_Chassis_Axle_RightFrontTireTemperature", DataType::Double),
    ("Vehicle_Chassis_Axle_RightRearTirePressure", DataType::Double),
    ("Vehicle_Chassis_Axle_RightRearTireTemperature", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_1_Temperature", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_2_Temperature", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_3_Temperature", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_4_Temperature", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_5_Temperature", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_6_Temperature", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_7_Temperature", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_8_Temperature", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_9_Temperature", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_10_Temperature", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_11_Temperature", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_12_Temperature", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_1_Voltage", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_2_Voltage", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_3_Voltage", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_4_Voltage", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_5_Voltage", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_6_Voltage", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_7_Voltage", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_8_Voltage", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_9_Voltage", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_10_Voltage", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_11_Voltage", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_12_Voltage", DataType::Double),
    ("Vehicle_Powertrain_Battery_Module_MaxCellVoltage", DataType::Double),
    ("Vehicle_Powertrain_Battery_StateOfCharge_Current", DataType::Double),
    ("Vehicle_Powertrain_BatteryMinTemperature", DataType::Double),
    ("Vehicle_Powertrain_BatteryMaxTemperature", DataType::Double),
];
