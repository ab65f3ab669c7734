use crate::error::Result;
use rusqlite::Connection;

/// Creates the tables if they don't exist:
/// - `Vehicle`: one row per VIN
/// - `VehicleVariable`: the decodable variable catalog
/// - `AdditionalCarInfo`: decoded attributes, keyed by (VariableId, VehicleId, Value)
/// - `CatalogVersion`: version of the variable catalog last applied
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS Vehicle (
            Vin TEXT NOT NULL PRIMARY KEY,
            DealerId TEXT NOT NULL,
            ModifiedDate TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS VehicleVariable (
            Id INTEGER NOT NULL PRIMARY KEY,
            Name TEXT NOT NULL
        );

        -- Value is part of the key: the decoder can repeat a variable id with different values.
        CREATE TABLE IF NOT EXISTS AdditionalCarInfo (
            VariableId INTEGER NOT NULL,
            VehicleId TEXT NOT NULL,
            Value TEXT NOT NULL,
            PRIMARY KEY (VariableId, VehicleId, Value),
            FOREIGN KEY (VariableId) REFERENCES VehicleVariable(Id) ON DELETE CASCADE,
            FOREIGN KEY (VehicleId) REFERENCES Vehicle(Vin) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS IX_AdditionalCarInfo_VehicleId ON AdditionalCarInfo(VehicleId);
        CREATE INDEX IF NOT EXISTS IX_Vehicle_DealerId ON Vehicle(DealerId);

        CREATE TABLE IF NOT EXISTS CatalogVersion (
            Name TEXT NOT NULL PRIMARY KEY,
            Version INTEGER NOT NULL
        );
        ",
    )?;

    log::info!("Database schema initialized");
    Ok(())
}
